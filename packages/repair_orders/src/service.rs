// ABOUTME: Repair order service coordinating locks, the state machine, and storage
// ABOUTME: Enforces roles, serializes per-RO writes, and notifies observers after commit

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use revv_core::{generate_id, non_blank, Actor, BillingMonth, Clock, SystemClock};
use revv_storage::StorageError;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::locks::RoLocks;
use crate::stages::Stage;
use crate::state_machine::{self, Transition};
use crate::storage::RepairOrderStorage;
use crate::types::{
    ApprovalDecision, ClaimStatus, PaymentType, RepairOrder, RepairOrderCreateInput,
    RepairOrderFilter, RepairOrderUpdateInput, RevenuePeriod, RoStatus,
};

/// Claim overrides reload and reapply this many times before giving up
const CLAIM_OVERRIDE_ATTEMPTS: usize = 3;

/// Hook run after a transition has been committed.
///
/// Observers cannot fail the transition; they log their own errors.
#[async_trait]
pub trait TransitionObserver: Send + Sync {
    async fn on_transition(&self, ro: &RepairOrder, transition: &Transition);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictPolicy {
    /// Surface the conflict so the client re-reads
    FailFast,
    /// Reload and reapply; overrides win races with normal advances
    Retry,
}

pub struct RepairOrderService {
    storage: Arc<RepairOrderStorage>,
    locks: RoLocks,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn TransitionObserver>>,
}

impl RepairOrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage: Arc::new(RepairOrderStorage::new(pool)),
            locks: RoLocks::new(),
            clock,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn storage(&self) -> &RepairOrderStorage {
        &self.storage
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: RepairOrderCreateInput,
    ) -> PipelineResult<RepairOrder> {
        require_member(actor, "create repair orders")?;

        let today = self.clock.today();
        let now = self.clock.now();
        let intake_date = input.intake_date.unwrap_or(today);
        if intake_date > today {
            return Err(PipelineError::Validation(
                "Intake date cannot be in the future".to_string(),
            ));
        }

        let customer_name = non_blank(Some(input.customer_name)).ok_or_else(|| {
            PipelineError::Validation("Customer name is required".to_string())
        })?;
        let customer_email = non_blank(input.customer_email);
        validate_email(customer_email.as_deref())?;
        validate_vehicle_year(input.vehicle_year)?;

        let ro = RepairOrder {
            id: generate_id("ro"),
            shop_id: actor.shop_id.clone(),
            ro_number: non_blank(input.ro_number),
            customer_name,
            customer_email,
            customer_phone: non_blank(input.customer_phone),
            vehicle_year: input.vehicle_year,
            vehicle_make: non_blank(input.vehicle_make),
            vehicle_model: non_blank(input.vehicle_model),
            vehicle_vin: non_blank(input.vehicle_vin).map(|vin| vin.to_uppercase()),
            status: RoStatus::Stage(Stage::Intake),
            resume_stage: None,
            claim_status: None,
            insurer: non_blank(input.insurer),
            claim_number: non_blank(input.claim_number),
            intake_date,
            estimated_delivery: input.estimated_delivery,
            actual_delivery: None,
            billing_month: BillingMonth::from_date(intake_date),
            revenue_period: None,
            revenue_month: None,
            payment_type: input.payment_type.unwrap_or(PaymentType::Insurance),
            parts_cost: money("parts_cost", input.parts_cost)?,
            labor_cost: money("labor_cost", input.labor_cost)?,
            sublet_cost: money("sublet_cost", input.sublet_cost)?,
            deductible: money("deductible", input.deductible)?,
            deductible_waived: money("deductible_waived", input.deductible_waived)?,
            referral_fee: money("referral_fee", input.referral_fee)?,
            goodwill_repair_cost: money("goodwill_repair_cost", input.goodwill_repair_cost)?,
            log: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.storage.create(&ro).await?;

        info!(
            "Created repair order {} for shop {} (billing month {})",
            ro.id, ro.shop_id, ro.billing_month
        );
        Ok(ro)
    }

    pub async fn get(&self, actor: &Actor, id: &str) -> PipelineResult<RepairOrder> {
        self.load(actor, id).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &RepairOrderFilter,
    ) -> PipelineResult<Vec<RepairOrder>> {
        Ok(self.storage.list(&actor.shop_id, filter).await?)
    }

    /// Edit non-pipeline fields. Blank strings clear optional text fields.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: RepairOrderUpdateInput,
    ) -> PipelineResult<RepairOrder> {
        require_member(actor, "edit repair orders")?;

        if input.is_empty() {
            return Err(PipelineError::Validation("No fields to update".to_string()));
        }
        validate_vehicle_year(input.vehicle_year)?;

        let _guard = self.locks.acquire(id).await;
        let mut ro = self.load(actor, id).await?;
        let expected_version = ro.version;

        apply_update(&mut ro, input)?;
        ro.updated_at = self.clock.now();

        if !self.storage.save_details(&ro, expected_version).await? {
            return Err(PipelineError::ConcurrentModification {
                ro_id: ro.id.clone(),
            });
        }
        ro.version = expected_version + 1;

        debug!("Updated details of repair order {}", ro.id);
        Ok(ro)
    }

    pub async fn advance(&self, actor: &Actor, id: &str) -> PipelineResult<RepairOrder> {
        require_member(actor, "advance repair orders")?;
        self.apply_transition(actor, id, ConflictPolicy::FailFast, |ro, at, by| {
            state_machine::advance(ro, at, by)
        })
        .await
    }

    pub async fn set_claim_status(
        &self,
        actor: &Actor,
        id: &str,
        claim: ClaimStatus,
    ) -> PipelineResult<RepairOrder> {
        require_admin(actor, "change the claim status")?;
        self.apply_transition(actor, id, ConflictPolicy::Retry, move |ro, at, by| {
            state_machine::set_claim_status(ro, claim, at, by)
        })
        .await
    }

    /// Change the claim status and edit fields as one write. Nothing is saved
    /// unless both the claim change and every edit are valid.
    pub async fn update_with_claim(
        &self,
        actor: &Actor,
        id: &str,
        claim: ClaimStatus,
        input: RepairOrderUpdateInput,
    ) -> PipelineResult<RepairOrder> {
        require_admin(actor, "change the claim status")?;
        validate_vehicle_year(input.vehicle_year)?;

        self.apply_transition(actor, id, ConflictPolicy::Retry, move |ro, at, by| {
            let transition = state_machine::set_claim_status(ro, claim, at, by)?;
            apply_update(ro, input.clone())?;
            Ok(transition)
        })
        .await
    }

    pub async fn send_for_approval(&self, actor: &Actor, id: &str) -> PipelineResult<RepairOrder> {
        require_member(actor, "send estimates for approval")?;
        self.apply_transition(actor, id, ConflictPolicy::FailFast, |ro, at, by| {
            state_machine::send_for_approval(ro, at, by)
        })
        .await
    }

    /// Record the approver's answer. Customers of the shop may answer too.
    pub async fn respond_to_approval(
        &self,
        actor: &Actor,
        id: &str,
        decision: ApprovalDecision,
        reason: Option<String>,
    ) -> PipelineResult<RepairOrder> {
        self.apply_transition(actor, id, ConflictPolicy::FailFast, move |ro, at, by| {
            state_machine::respond_to_approval(ro, decision, reason.clone(), at, by)
        })
        .await
    }

    pub async fn assign_revenue_period(
        &self,
        actor: &Actor,
        id: &str,
        period: RevenuePeriod,
    ) -> PipelineResult<RepairOrder> {
        require_admin(actor, "assign revenue periods")?;
        let current_month = self.clock.current_month();
        self.apply_transition(actor, id, ConflictPolicy::FailFast, move |ro, at, by| {
            state_machine::assign_revenue_period(ro, period, current_month, at, by)
        })
        .await
    }

    async fn load(&self, actor: &Actor, id: &str) -> PipelineResult<RepairOrder> {
        self.storage
            .get(&actor.shop_id, id)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => PipelineError::NotFound(id.to_string()),
                other => other.into(),
            })
    }

    /// Apply one state machine step under the RO lock, then notify observers
    /// once the lock is released.
    async fn apply_transition<F>(
        &self,
        actor: &Actor,
        id: &str,
        policy: ConflictPolicy,
        apply: F,
    ) -> PipelineResult<RepairOrder>
    where
        F: Fn(&mut RepairOrder, DateTime<Utc>, &str) -> PipelineResult<Transition> + Send + Sync,
    {
        let (ro, transition) = self.commit_transition(actor, id, policy, apply).await?;
        self.notify(&ro, &transition).await;
        Ok(ro)
    }

    /// Lock the RO, apply one state machine step, and persist it under the
    /// version guard.
    async fn commit_transition<F>(
        &self,
        actor: &Actor,
        id: &str,
        policy: ConflictPolicy,
        apply: F,
    ) -> PipelineResult<(RepairOrder, Transition)>
    where
        F: Fn(&mut RepairOrder, DateTime<Utc>, &str) -> PipelineResult<Transition> + Send + Sync,
    {
        let _guard = self.locks.acquire(id).await;

        let attempts = match policy {
            ConflictPolicy::FailFast => 1,
            ConflictPolicy::Retry => CLAIM_OVERRIDE_ATTEMPTS,
        };

        for attempt in 1..=attempts {
            let mut ro = self.load(actor, id).await?;
            let expected_version = ro.version;
            let logged_before = ro.log.len();

            let transition = apply(&mut ro, self.clock.now(), &actor.user_id)?;

            let saved = self
                .storage
                .save_transition(&ro, expected_version, &ro.log[logged_before..])
                .await?;

            if saved {
                ro.version = expected_version + 1;
                info!(
                    "Repair order {} moved {} -> {} by {}",
                    ro.id, transition.from, transition.to, actor.user_id
                );
                return Ok((ro, transition));
            }

            warn!(
                "Version conflict on repair order {} (attempt {}/{})",
                id, attempt, attempts
            );
        }

        Err(PipelineError::ConcurrentModification {
            ro_id: id.to_string(),
        })
    }

    async fn notify(&self, ro: &RepairOrder, transition: &Transition) {
        for observer in &self.observers {
            observer.on_transition(ro, transition).await;
        }
    }
}

fn require_member(actor: &Actor, action: &str) -> PipelineResult<()> {
    if actor.is_shop_member() {
        Ok(())
    } else {
        Err(PipelineError::Forbidden(format!(
            "Your role ({}) cannot {}",
            actor.role, action
        )))
    }
}

fn require_admin(actor: &Actor, action: &str) -> PipelineResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(PipelineError::Forbidden(format!(
            "Only owners and admins can {}",
            action
        )))
    }
}

fn money(field: &str, value: Option<f64>) -> PipelineResult<f64> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(PipelineError::Validation(format!(
            "{} must be a non-negative amount",
            field
        )));
    }
    Ok(value)
}

fn validate_email(email: Option<&str>) -> PipelineResult<()> {
    match email {
        Some(email) if !email.contains('@') => Err(PipelineError::Validation(format!(
            "'{}' is not a valid email address",
            email
        ))),
        _ => Ok(()),
    }
}

fn validate_vehicle_year(year: Option<i32>) -> PipelineResult<()> {
    match year {
        Some(year) if !(1900..=2100).contains(&year) => Err(PipelineError::Validation(format!(
            "Vehicle year {} is out of range",
            year
        ))),
        _ => Ok(()),
    }
}

fn apply_update(ro: &mut RepairOrder, input: RepairOrderUpdateInput) -> PipelineResult<()> {
    if let Some(name) = input.customer_name {
        ro.customer_name = non_blank(Some(name)).ok_or_else(|| {
            PipelineError::Validation("Customer name cannot be blank".to_string())
        })?;
    }
    if let Some(email) = input.customer_email {
        let email = non_blank(Some(email));
        validate_email(email.as_deref())?;
        ro.customer_email = email;
    }

    set_text(&mut ro.ro_number, input.ro_number);
    set_text(&mut ro.customer_phone, input.customer_phone);
    set_text(&mut ro.vehicle_make, input.vehicle_make);
    set_text(&mut ro.vehicle_model, input.vehicle_model);
    set_text(&mut ro.insurer, input.insurer);
    set_text(&mut ro.claim_number, input.claim_number);
    if let Some(vin) = input.vehicle_vin {
        ro.vehicle_vin = non_blank(Some(vin)).map(|vin| vin.to_uppercase());
    }

    if let Some(year) = input.vehicle_year {
        ro.vehicle_year = Some(year);
    }
    if let Some(payment_type) = input.payment_type {
        ro.payment_type = payment_type;
    }
    if let Some(date) = input.estimated_delivery {
        set_estimated_delivery(ro, date)?;
    }

    set_money(&mut ro.parts_cost, "parts_cost", input.parts_cost)?;
    set_money(&mut ro.labor_cost, "labor_cost", input.labor_cost)?;
    set_money(&mut ro.sublet_cost, "sublet_cost", input.sublet_cost)?;
    set_money(&mut ro.deductible, "deductible", input.deductible)?;
    set_money(&mut ro.deductible_waived, "deductible_waived", input.deductible_waived)?;
    set_money(&mut ro.referral_fee, "referral_fee", input.referral_fee)?;
    set_money(
        &mut ro.goodwill_repair_cost,
        "goodwill_repair_cost",
        input.goodwill_repair_cost,
    )?;

    Ok(())
}

fn set_text(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = non_blank(value);
    }
}

fn set_money(field: &mut f64, name: &str, value: Option<f64>) -> PipelineResult<()> {
    if value.is_some() {
        *field = money(name, value)?;
    }
    Ok(())
}

fn set_estimated_delivery(ro: &mut RepairOrder, date: NaiveDate) -> PipelineResult<()> {
    if date < ro.intake_date {
        return Err(PipelineError::Validation(
            "Estimated delivery cannot be before the intake date".to_string(),
        ));
    }
    ro.estimated_delivery = Some(date);
    Ok(())
}
