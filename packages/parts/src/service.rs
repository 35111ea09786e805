// ABOUTME: Part service for ordering, editing, and manual status changes
// ABOUTME: Validates inputs, keeps received_date in step with status, and scopes everything by shop

use std::sync::Arc;

use revv_core::{generate_id, non_blank, Actor, Clock, SystemClock};
use revv_storage::StorageError;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{PartsError, PartsResult};
use crate::storage::PartStorage;
use crate::types::{Part, PartCreateInput, PartStatus, PartUpdateInput};

pub struct PartService {
    storage: Arc<PartStorage>,
    clock: Arc<dyn Clock>,
}

impl PartService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Arc::new(PartStorage::new(pool)),
            clock,
        }
    }

    pub fn storage(&self) -> Arc<PartStorage> {
        self.storage.clone()
    }

    pub async fn create(
        &self,
        actor: &Actor,
        ro_id: &str,
        input: PartCreateInput,
    ) -> PartsResult<Part> {
        require_member(actor)?;

        if !self
            .storage
            .repair_order_exists(&actor.shop_id, ro_id)
            .await?
        {
            return Err(PartsError::NotFound(format!("repair order {}", ro_id)));
        }

        let part_name = non_blank(Some(input.part_name))
            .ok_or_else(|| PartsError::Validation("Part name is required".to_string()))?;
        let quantity = validate_quantity(input.quantity.unwrap_or(1))?;
        let unit_cost = validate_cost(input.unit_cost.unwrap_or(0.0))?;

        let status = input.status.unwrap_or(PartStatus::Ordered);
        if !status.is_awaiting_delivery() {
            return Err(PartsError::Validation(
                "New parts start as ordered or backordered".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut part = Part {
            id: generate_id("part"),
            shop_id: actor.shop_id.clone(),
            ro_id: ro_id.to_string(),
            part_name,
            part_number: non_blank(input.part_number),
            vendor: non_blank(input.vendor),
            quantity,
            unit_cost,
            status,
            tracking_number: None,
            carrier: None,
            tracking_status: None,
            tracking_detail: None,
            tracking_updated_at: None,
            expected_date: input.expected_date,
            received_date: None,
            created_at: now,
            updated_at: now,
        };
        part.set_tracking_number(input.tracking_number);

        self.storage.create(&part).await?;

        info!(
            "Ordered part {} ({}) for repair order {}",
            part.id, part.part_name, part.ro_id
        );
        Ok(part)
    }

    pub async fn get(&self, actor: &Actor, id: &str) -> PartsResult<Part> {
        self.storage
            .get(&actor.shop_id, id)
            .await
            .map_err(|err| not_found(err, id))
    }

    pub async fn list_for_repair_order(&self, actor: &Actor, ro_id: &str) -> PartsResult<Vec<Part>> {
        Ok(self
            .storage
            .list_for_repair_order(&actor.shop_id, ro_id)
            .await?)
    }

    pub async fn update(&self, actor: &Actor, id: &str, input: PartUpdateInput) -> PartsResult<Part> {
        require_member(actor)?;
        if input.is_empty() {
            return Err(PartsError::Validation("No fields to update".to_string()));
        }

        let mut part = self.get(actor, id).await?;

        if let Some(name) = input.part_name {
            part.part_name = non_blank(Some(name))
                .ok_or_else(|| PartsError::Validation("Part name cannot be blank".to_string()))?;
        }
        if input.part_number.is_some() {
            part.part_number = non_blank(input.part_number);
        }
        if input.vendor.is_some() {
            part.vendor = non_blank(input.vendor);
        }
        if let Some(quantity) = input.quantity {
            part.quantity = validate_quantity(quantity)?;
        }
        if let Some(cost) = input.unit_cost {
            part.unit_cost = validate_cost(cost)?;
        }
        if let Some(date) = input.expected_date {
            part.expected_date = Some(date);
        }
        let previous_number = part.tracking_number.clone();
        let number_changed = match input.tracking_number {
            Some(number) => part.set_tracking_number(Some(number)),
            None => false,
        };

        part.updated_at = self.clock.now();
        let saved = self
            .storage
            .save_details(&part, previous_number.as_deref(), number_changed)
            .await
            .map_err(|err| not_found(err, id))?;
        if !saved {
            return Err(PartsError::ConcurrentModification {
                part_id: part.id.clone(),
            });
        }

        // Reload so status and tracking state reflect any concurrent poll
        self.get(actor, id).await
    }

    /// Manual status change from the parts board. `cancelled` is final.
    pub async fn set_status(&self, actor: &Actor, id: &str, status: PartStatus) -> PartsResult<Part> {
        require_member(actor)?;

        let mut part = self.get(actor, id).await?;
        if part.status == status {
            return Ok(part);
        }
        if part.status == PartStatus::Cancelled {
            return Err(PartsError::InvalidTransition {
                from: part.status,
                to: status,
            });
        }

        let expected = part.status;
        part.received_date = match status {
            PartStatus::Received => Some(self.clock.today()),
            _ => None,
        };
        part.status = status;
        part.updated_at = self.clock.now();

        if !self.storage.save_status(&part, expected).await? {
            return Err(PartsError::ConcurrentModification {
                part_id: part.id.clone(),
            });
        }

        info!("Part {} marked {}", part.id, part.status);
        Ok(part)
    }
}

pub(crate) fn require_member(actor: &Actor) -> PartsResult<()> {
    if actor.is_shop_member() {
        Ok(())
    } else {
        Err(PartsError::Forbidden(format!(
            "Your role ({}) cannot change parts",
            actor.role
        )))
    }
}

pub(crate) fn not_found(err: StorageError, id: &str) -> PartsError {
    match err {
        StorageError::NotFound => PartsError::NotFound(id.to_string()),
        other => other.into(),
    }
}

fn validate_quantity(quantity: i64) -> PartsResult<i64> {
    if quantity <= 0 {
        return Err(PartsError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(quantity)
}

fn validate_cost(cost: f64) -> PartsResult<f64> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(PartsError::Validation(
            "Unit cost must be a non-negative amount".to_string(),
        ));
    }
    Ok(cost)
}
