mod read;
mod types;
mod write;

/// Column list shared by every statement returning a full post row.
const POST_COLUMNS: &str = "p.id, p.user_id, p.heading, p.caption, p.hookline, p.cta, \
    p.hashtags, p.social, p.image_url, p.status, p.comment, p.posted_at, \
    p.created_at, p.updated_at";
