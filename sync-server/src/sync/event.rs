//! Scheduling event normalizer
//!
//! The scheduling platform delivers the same logical event in several
//! incompatible JSON shapes: fields may sit at the top level, under a
//! `payload` wrapper, inside an `Appointment` sub-object, or on the first
//! entry of its `Services` array, with PascalCase or camelCase keys at any
//! level. Every field is resolved through one ordered fallback chain over
//! those containers; the first non-empty candidate wins. Downstream code
//! and tests depend on this precedence exactly — never branch per shape.

use serde_json::Value;

/// Event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Booking or update of an appointment
    Booking,
    /// Cancellation; `deleted` when the source indicated deletion
    Cancellation { deleted: bool },
}

/// Canonical fields extracted from a raw scheduling payload
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub service_provider_id: Option<String>,
    /// Candidate display name for the provider, when the payload carries one
    pub service_provider_name: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub business_id: Option<String>,
    /// Defaults to 0 when no amount field matches
    pub total_amount: f64,
    pub service_title: Option<String>,
    pub appointment_id: Option<String>,
    /// Defaults to the processing instant when absent or unparseable
    pub appointment_at: i64,
}

/// Containers in precedence order: top level → `payload` wrapper →
/// `Appointment` sub-object → first entry of its `Services` array.
fn containers(raw: &Value) -> Vec<&Value> {
    let mut out = vec![raw];

    if let Some(wrapper) = raw.get("payload").or_else(|| raw.get("Payload")) {
        if wrapper.is_object() {
            out.push(wrapper);
        }
    }

    if let Some(appointment) = out
        .clone()
        .into_iter()
        .find_map(|c| c.get("Appointment").or_else(|| c.get("appointment")))
    {
        if appointment.is_object() {
            out.push(appointment);

            if let Some(service) = appointment
                .get("Services")
                .or_else(|| appointment.get("services"))
                .and_then(|s| s.as_array())
                .and_then(|s| s.first())
            {
                if service.is_object() {
                    out.push(service);
                }
            }
        }
    }

    out
}

/// Walk the (container, key-variant) chain and return the first non-empty
/// candidate.
fn resolve<'a>(containers: &[&'a Value], keys: &[&str]) -> Option<&'a Value> {
    for container in containers {
        for key in keys {
            if let Some(value) = container.get(*key) {
                if !is_empty(value) {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// String form of a scalar candidate (numbers included — ids arrive both
/// quoted and unquoted)
fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Amount form of a candidate; amounts arrive as numbers or strings
fn as_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn resolve_string(containers: &[&Value], keys: &[&str]) -> Option<String> {
    resolve(containers, keys).and_then(as_string)
}

/// Parse an appointment instant: RFC 3339, naive datetime, naive date, or
/// a raw Unix-millis number.
fn parse_instant(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    let s = value.as_str()?.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

const EVENT_TYPE_KEYS: &[&str] = &[
    "EventType",
    "eventType",
    "Event",
    "event",
    "Action",
    "action",
    "Type",
    "type",
];

const STATUS_KEYS: &[&str] = &["Status", "status"];

/// Classify the event. Cancellation when an event-type/action field
/// contains `cancel`/`delete` (any case) or a status field equals
/// `canceled`/`cancelled`/`deleted`.
fn classify(containers: &[&Value]) -> EventKind {
    if let Some(event_type) = resolve_string(containers, EVENT_TYPE_KEYS) {
        let lowered = event_type.to_lowercase();
        if lowered.contains("delete") {
            return EventKind::Cancellation { deleted: true };
        }
        if lowered.contains("cancel") {
            return EventKind::Cancellation { deleted: false };
        }
    }

    if let Some(status) = resolve_string(containers, STATUS_KEYS) {
        let lowered = status.to_lowercase();
        if lowered == "deleted" {
            return EventKind::Cancellation { deleted: true };
        }
        if lowered == "canceled" || lowered == "cancelled" {
            return EventKind::Cancellation { deleted: false };
        }
    }

    EventKind::Booking
}

/// Extract canonical fields from a raw scheduling payload.
///
/// `now_ms` is the processing instant, used when no appointment time can
/// be resolved.
pub fn normalize(raw: &Value, now_ms: i64) -> NormalizedEvent {
    let containers = containers(raw);

    let total_amount = resolve(
        &containers,
        &["TotalAmount", "totalAmount", "Total", "total"],
    )
    .and_then(as_amount)
    // Line-item price is the last resort before defaulting to 0
    .or_else(|| resolve(&containers, &["Price", "price"]).and_then(as_amount))
    .unwrap_or(0.0);

    let appointment_id = resolve_string(&containers, &["AppointmentId", "appointmentId"])
        .or_else(|| {
            // The appointment object's own bare `Id` also identifies it
            raw.get("Appointment")
                .or_else(|| raw.get("appointment"))
                .or_else(|| {
                    raw.get("payload")
                        .or_else(|| raw.get("Payload"))
                        .and_then(|w| w.get("Appointment").or_else(|| w.get("appointment")))
                })
                .and_then(|a| resolve_string(&[a], &["Id", "id"]))
        });

    let appointment_at = resolve(
        &containers,
        &[
            "AppointmentDateTime",
            "appointmentDateTime",
            "StartDateTime",
            "startDateTime",
            "StartTime",
            "startTime",
            "Date",
            "date",
        ],
    )
    .and_then(parse_instant)
    .unwrap_or(now_ms);

    NormalizedEvent {
        kind: classify(&containers),
        service_provider_id: resolve_string(
            &containers,
            &[
                "ServiceProviderId",
                "serviceProviderId",
                "ProviderId",
                "providerId",
            ],
        ),
        service_provider_name: resolve_string(
            &containers,
            &[
                "ServiceProviderName",
                "serviceProviderName",
                "StaffName",
                "staffName",
            ],
        ),
        customer_id: resolve_string(&containers, &["CustomerId", "customerId"]),
        customer_name: resolve_string(
            &containers,
            &["CustomerName", "customerName", "ClientName", "clientName"],
        ),
        customer_email: resolve_string(
            &containers,
            &["CustomerEmail", "customerEmail", "Email", "email"],
        ),
        business_id: resolve_string(&containers, &["BusinessId", "businessId"]),
        total_amount,
        service_title: resolve_string(
            &containers,
            &[
                "ServiceTitle",
                "serviceTitle",
                "ServiceName",
                "serviceName",
                "Title",
                "title",
                "Name",
                "name",
            ],
        ),
        appointment_id,
        appointment_at,
    }
}
