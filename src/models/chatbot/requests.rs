use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/chatbot.ts")]
pub struct SendMessageRequest {
    pub text: String,
}
