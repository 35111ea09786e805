// ABOUTME: Customer-facing message templates for repair order status changes
// ABOUTME: Stage copy for pipeline moves plus dedicated copy for holds and estimate approval

use revv_repair_orders::{HoldReason, RepairOrder, RoStatus, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

fn vehicle_description(ro: &RepairOrder) -> String {
    let parts: Vec<String> = [
        ro.vehicle_year.map(|y| y.to_string()),
        ro.vehicle_make.clone(),
        ro.vehicle_model.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "your vehicle".to_string()
    } else {
        format!("your {}", parts.join(" "))
    }
}

fn status_copy(status: RoStatus) -> (&'static str, &'static str) {
    match status {
        RoStatus::Stage(stage) => (stage.label(), stage.customer_message()),
        RoStatus::AwaitingApproval => (
            "Estimate Ready",
            "Your repair estimate is ready. Please review and approve it so we can get started.",
        ),
        RoStatus::Hold {
            reason: HoldReason::Siu,
            ..
        } => (
            "On Hold",
            "Your repair is on hold while your insurance company reviews the claim. We'll let you know as soon as we can continue.",
        ),
        RoStatus::Hold {
            reason: HoldReason::TotalLoss,
            ..
        } => (
            "Insurance Update",
            "Your insurance company has marked this claim as a total loss. Someone from the shop will contact you about next steps.",
        ),
    }
}

/// Message sent when an RO moves to `status`
pub fn compose(ro: &RepairOrder, status: RoStatus, shop_name: &str) -> Message {
    let (headline, copy) = status_copy(status);
    let reference = ro
        .ro_number
        .as_deref()
        .map(|n| format!(" (RO #{})", n))
        .unwrap_or_default();

    let subject = format!("{}: {}{}", shop_name, headline, reference);
    let mut body = format!(
        "Hi {}, an update on {} from {}:\n\n{}",
        first_name(&ro.customer_name),
        vehicle_description(ro),
        shop_name,
        copy
    );

    if status == RoStatus::Stage(Stage::Delivery) {
        if let Some(date) = ro.actual_delivery {
            body.push_str(&format!("\n\nReady since {}.", date.format("%B %-d, %Y")));
        }
    }

    Message { subject, body }
}

/// One-line SMS variant of the same update
pub fn compose_sms(ro: &RepairOrder, status: RoStatus, shop_name: &str) -> String {
    let (_, copy) = status_copy(status);
    match ro.ro_number.as_deref() {
        Some(number) => format!("{} RO #{}: {}", shop_name, number, copy),
        None => format!("{}: {}", shop_name, copy),
    }
}

fn first_name(full: &str) -> &str {
    full.split_whitespace().next().unwrap_or(full)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use revv_repair_orders::PaymentType;

    pub(crate) fn customer_ro() -> RepairOrder {
        let created = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        RepairOrder {
            id: "ro-1".to_string(),
            shop_id: "shop-1".to_string(),
            ro_number: Some("1042".to_string()),
            customer_name: "Dana Reyes".to_string(),
            customer_email: Some("dana@example.com".to_string()),
            customer_phone: Some("+15555550100".to_string()),
            vehicle_year: Some(2019),
            vehicle_make: Some("Honda".to_string()),
            vehicle_model: Some("Civic".to_string()),
            vehicle_vin: None,
            status: RoStatus::Stage(Stage::Intake),
            resume_stage: None,
            claim_status: None,
            insurer: None,
            claim_number: None,
            intake_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            estimated_delivery: None,
            actual_delivery: None,
            billing_month: "2026-01".parse().unwrap(),
            revenue_period: None,
            revenue_month: None,
            payment_type: PaymentType::Insurance,
            parts_cost: 0.0,
            labor_cost: 0.0,
            sublet_cost: 0.0,
            deductible: 0.0,
            deductible_waived: 0.0,
            referral_fee: 0.0,
            goodwill_repair_cost: 0.0,
            log: Vec::new(),
            version: 1,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_stage_message_uses_stage_copy() {
        let ro = customer_ro();
        let message = compose(&ro, RoStatus::Stage(Stage::Paint), "Eastside Collision");

        assert_eq!(message.subject, "Eastside Collision: Paint (RO #1042)");
        assert!(message.body.starts_with("Hi Dana, an update on your 2019 Honda Civic"));
        assert!(message.body.contains(Stage::Paint.customer_message()));
    }

    #[test]
    fn test_branch_states_have_their_own_copy() {
        let ro = customer_ro();
        let held = compose(
            &ro,
            RoStatus::Hold {
                reason: HoldReason::Siu,
                resume_stage: Stage::Repair,
            },
            "REVV",
        );
        assert!(held.subject.contains("On Hold"));

        let estimate = compose(&ro, RoStatus::AwaitingApproval, "REVV");
        assert!(estimate.body.contains("approve"));
    }

    #[test]
    fn test_delivery_mentions_ready_date() {
        let mut ro = customer_ro();
        ro.actual_delivery = NaiveDate::from_ymd_opt(2026, 1, 20);
        let message = compose(&ro, RoStatus::Stage(Stage::Delivery), "REVV");
        assert!(message.body.ends_with("Ready since January 20, 2026."));
    }

    #[test]
    fn test_vehicle_fallback() {
        let mut ro = customer_ro();
        ro.vehicle_year = None;
        ro.vehicle_make = None;
        ro.vehicle_model = None;
        let message = compose(&ro, RoStatus::Stage(Stage::Qc), "REVV");
        assert!(message.body.contains("an update on your vehicle"));
    }

    #[test]
    fn test_sms_is_one_line() {
        let ro = customer_ro();
        let sms = compose_sms(&ro, RoStatus::Stage(Stage::Delivery), "REVV");
        assert_eq!(
            sms,
            format!("REVV RO #1042: {}", Stage::Delivery.customer_message())
        );
        assert!(!sms.contains('\n'));
    }
}
