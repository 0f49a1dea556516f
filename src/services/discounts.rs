use crate::{
    db::DbPool,
    entities::{
        discount::{ActiveModel as DiscountActiveModel, Model as DiscountModel},
        Discount as DiscountEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Storewide discount message. At most one row exists; setting the message
/// replaces whatever is currently stored.
#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DiscountService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_discount(&self) -> Result<Option<DiscountModel>, ServiceError> {
        let discount = DiscountEntity::find().one(&*self.db).await?;
        Ok(discount)
    }

    #[instrument(skip(self, text))]
    pub async fn set_discount(&self, text: String) -> Result<DiscountModel, ServiceError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError(
                "Discount text must not be empty".to_string(),
            ));
        }

        let existing = DiscountEntity::find().one(&*self.db).await?;
        let saved = match existing {
            Some(model) => {
                let mut active: DiscountActiveModel = model.into();
                active.text = Set(trimmed.to_string());
                active.update(&*self.db).await?
            }
            None => {
                DiscountActiveModel {
                    id: Set(Uuid::new_v4()),
                    text: Set(trimmed.to_string()),
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!("Storewide discount message updated");
        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::DiscountUpdated).await;
        }

        Ok(saved)
    }
}
