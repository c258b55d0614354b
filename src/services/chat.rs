use crate::{
    entities::{chat_message, ChatMessage},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Input for sending a chat message
#[derive(Debug, Deserialize, Serialize)]
pub struct SendMessageInput {
    pub product_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub message: String,
}

/// Per-counterpart rollup of a user's message history: the most recent
/// exchange plus how many of the counterpart's messages are still unread
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationSummary {
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub product_id: Uuid,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: u64,
}

/// Buyer-seller chat around products. Delivery is pull-based; clients poll
/// the conversation endpoints.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ChatService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn send_message(
        &self,
        input: SendMessageInput,
    ) -> Result<chat_message::Model, ServiceError> {
        if input.message.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }
        if input.sender_id == input.receiver_id {
            return Err(ServiceError::ValidationError(
                "Sender and receiver must differ".to_string(),
            ));
        }

        let row = chat_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            sender_id: Set(input.sender_id),
            sender_name: Set(input.sender_name),
            receiver_id: Set(input.receiver_id),
            receiver_name: Set(input.receiver_name),
            message: Set(input.message),
            read: Set(false),
            created_at: Set(Utc::now()),
        };
        let model = row.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MessageSent {
                product_id: model.product_id,
                sender_id: model.sender_id,
                receiver_id: model.receiver_id,
            })
            .await;

        Ok(model)
    }

    /// Both directions of one product conversation, oldest first
    #[instrument(skip(self))]
    pub async fn conversation(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<Vec<chat_message::Model>, ServiceError> {
        ChatMessage::find()
            .filter(chat_message::Column::ProductId.eq(product_id))
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(chat_message::Column::SenderId.eq(user_id))
                            .add(chat_message::Column::ReceiverId.eq(other_user_id)),
                    )
                    .add(
                        Condition::all()
                            .add(chat_message::Column::SenderId.eq(other_user_id))
                            .add(chat_message::Column::ReceiverId.eq(user_id)),
                    ),
            )
            .order_by_asc(chat_message::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Conversation summaries for a user, most recent first. Messages are
    /// grouped by counterpart; the first message seen per counterpart in
    /// the newest-first scan carries the conversation excerpt.
    #[instrument(skip(self))]
    pub async fn conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, ServiceError> {
        let messages = ChatMessage::find()
            .filter(
                Condition::any()
                    .add(chat_message::Column::SenderId.eq(user_id))
                    .add(chat_message::Column::ReceiverId.eq(user_id)),
            )
            .order_by_desc(chat_message::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(summarize_conversations(user_id, &messages))
    }

    /// Marks the counterpart's unread messages in one product conversation
    /// as read; returns how many were flipped
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = ChatMessage::update_many()
            .col_expr(chat_message::Column::Read, Expr::value(true))
            .filter(chat_message::Column::ProductId.eq(product_id))
            .filter(chat_message::Column::SenderId.eq(other_user_id))
            .filter(chat_message::Column::ReceiverId.eq(user_id))
            .filter(chat_message::Column::Read.eq(false))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

/// Folds a newest-first message list into per-counterpart summaries.
/// Unread counts only messages addressed to `user_id`.
fn summarize_conversations(
    user_id: Uuid,
    messages: &[chat_message::Model],
) -> Vec<ConversationSummary> {
    let mut summaries: Vec<ConversationSummary> = Vec::new();
    let mut index_of: HashMap<Uuid, usize> = HashMap::new();

    for message in messages {
        let incoming = message.receiver_id == user_id;
        let (other_id, other_name) = if incoming {
            (message.sender_id, message.sender_name.clone())
        } else {
            (message.receiver_id, message.receiver_name.clone())
        };

        let idx = match index_of.get(&other_id) {
            Some(&idx) => idx,
            None => {
                summaries.push(ConversationSummary {
                    other_user_id: other_id,
                    other_user_name: other_name,
                    product_id: message.product_id,
                    last_message: message.message.clone(),
                    last_message_time: message.created_at,
                    unread_count: 0,
                });
                index_of.insert(other_id, summaries.len() - 1);
                summaries.len() - 1
            }
        };

        if incoming && !message.read {
            summaries[idx].unread_count += 1;
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(
        sender: Uuid,
        receiver: Uuid,
        product: Uuid,
        text: &str,
        read: bool,
        age_minutes: i64,
    ) -> chat_message::Model {
        chat_message::Model {
            id: Uuid::new_v4(),
            product_id: product,
            sender_id: sender,
            sender_name: format!("user-{}", &sender.to_string()[..8]),
            receiver_id: receiver,
            receiver_name: format!("user-{}", &receiver.to_string()[..8]),
            message: text.to_string(),
            read,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn summaries_group_by_counterpart_and_keep_latest_excerpt() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let product = Uuid::new_v4();

        // Newest first, matching the query ordering
        let messages = vec![
            message(alice, me, product, "latest from alice", false, 1),
            message(me, bob, product, "my reply to bob", false, 2),
            message(alice, me, product, "older from alice", false, 3),
            message(bob, me, product, "first from bob", true, 4),
        ];

        let summaries = summarize_conversations(me, &messages);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].other_user_id, alice);
        assert_eq!(summaries[0].last_message, "latest from alice");
        assert_eq!(summaries[0].unread_count, 2);

        assert_eq!(summaries[1].other_user_id, bob);
        assert_eq!(summaries[1].last_message, "my reply to bob");
        // Bob's only inbound message was already read
        assert_eq!(summaries[1].unread_count, 0);
    }

    #[test]
    fn outbound_messages_never_count_as_unread() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let product = Uuid::new_v4();

        let messages = vec![message(me, alice, product, "sent by me", false, 1)];
        let summaries = summarize_conversations(me, &messages);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].unread_count, 0);
    }
}
