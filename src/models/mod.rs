mod book;
mod webhook;

pub use book::{Book, BookId, Rating, UserId};
pub use webhook::{
    FulfillmentInfo, FulfillmentResponse, IntentInfo, IntentParameter, ResponseMessage,
    SessionInfo, TextMessage, WebhookRequest, WebhookResponse,
};
