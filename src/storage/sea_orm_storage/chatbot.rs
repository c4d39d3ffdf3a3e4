use super::{DbResultExt, SeaOrmStorage};
use crate::entity::chat_messages::{
    ActiveModel as MessageActiveModel, Column as MessageColumn, Entity as ChatMessages,
};
use crate::entity::chat_sessions::{ActiveModel, Column, Entity as ChatSessions};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    chatbot::entities::{ChatExchange, ChatMessage, ChatSender, ChatSession},
    users::entities::UserRole,
};
use crate::utils::now_ts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建聊天会话
    pub async fn create_chat_session_impl(&self, user_id: i64, role: UserRole) -> Result<ChatSession> {
        let now = now_ts();

        let model = ActiveModel {
            session_key: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id),
            last_user_role: Set(role.to_string()),
            message_count: Set(0),
            matched_count: Set(0),
            fallback_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .db_context("创建聊天会话失败")?;

        Ok(result.into_chat_session())
    }

    /// 通过会话标识获取会话
    pub async fn get_chat_session_impl(&self, session_key: &str) -> Result<Option<ChatSession>> {
        let result = ChatSessions::find()
            .filter(Column::SessionKey.eq(session_key))
            .one(&self.db)
            .await
            .db_context("查询聊天会话失败")?;

        Ok(result.map(|m| m.into_chat_session()))
    }

    /// 追加一轮对话并更新会话统计
    pub async fn append_chat_exchange_impl(
        &self,
        exchange: ChatExchange,
    ) -> Result<(ChatMessage, ChatMessage, ChatSession)> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let user_message = MessageActiveModel {
            session_id: Set(exchange.session_id),
            sender: Set(ChatSender::User.to_string()),
            content: Set(exchange.user_text),
            matched_rule: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .db_context("保存用户消息失败")?;

        let (matched_inc, fallback_inc) = if exchange.matched_rule.is_some() {
            (1, 0)
        } else {
            (0, 1)
        };

        let bot_message = MessageActiveModel {
            session_id: Set(exchange.session_id),
            sender: Set(ChatSender::Bot.to_string()),
            content: Set(exchange.reply),
            matched_rule: Set(exchange.matched_rule),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .db_context("保存机器人回复失败")?;

        ChatSessions::update_many()
            .col_expr(Column::MessageCount, Expr::cust("message_count + 2"))
            .col_expr(
                Column::MatchedCount,
                Expr::cust(format!("matched_count + {matched_inc}")),
            )
            .col_expr(
                Column::FallbackCount,
                Expr::cust(format!("fallback_count + {fallback_inc}")),
            )
            .col_expr(
                Column::LastUserRole,
                Expr::value(exchange.user_role.as_str()),
            )
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(exchange.session_id))
            .exec(&txn)
            .await
            .db_context("更新会话统计失败")?;

        let session = ChatSessions::find_by_id(exchange.session_id)
            .one(&txn)
            .await
            .db_context("查询聊天会话失败")?
            .ok_or_else(|| ClassroomError::not_found("Chat session not found"))?;

        txn.commit().await.db_context("提交对话事务失败")?;

        Ok((
            user_message.into_chat_message(),
            bot_message.into_chat_message(),
            session.into_chat_session(),
        ))
    }

    /// 会话消息，按写入顺序
    pub async fn list_chat_messages_impl(&self, session_id: i64) -> Result<Vec<ChatMessage>> {
        let messages = ChatMessages::find()
            .filter(MessageColumn::SessionId.eq(session_id))
            .order_by_asc(MessageColumn::Id)
            .all(&self.db)
            .await
            .db_context("查询聊天记录失败")?;

        Ok(messages.into_iter().map(|m| m.into_chat_message()).collect())
    }
}
