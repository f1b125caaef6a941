use chrono::{DateTime, Utc};
use poem_openapi::Object;

#[derive(Object, Debug)]
#[oai(rename_all = "snake_case")]
pub struct CreateMessageRequestDto {
    #[oai(validator(min_length = 1))]
    pub destination: String,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Object, Debug)]
#[oai(rename_all = "snake_case")]
pub struct UpdateMessageContentRequestDto {
    pub content: String,
}
