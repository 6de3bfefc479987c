use std::sync::Arc;

use crate::application::images::ImageService;
use crate::application::repos::{PostsRepo, PostsWriteRepo, UsersRepo};

pub(super) const ACTOR: &str = "admin";

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) users: Arc<dyn UsersRepo>,
    pub(crate) images: Arc<ImageService>,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        users: Arc<dyn UsersRepo>,
        images: Arc<ImageService>,
    ) -> Self {
        Self {
            reader,
            writer,
            users,
            images,
        }
    }
}
