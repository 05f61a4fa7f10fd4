// src/checkout/wizard.rs

//! Two-step checkout wizard: shipping -> payment -> (on server ack) complete.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::checkout::form::FormState;
use crate::checkout::rules::{FieldRules, RuleSet, Values};
use crate::services::pricing;

#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Cannot start checkout with an empty cart")]
  EmptyCart,
  #[error("Action not available on the {0:?} step")]
  WrongStep(CheckoutStep),
  #[error("Form validation failed")]
  ValidationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
  Shipping,
  Payment,
}

/// Explicit session state injected into the wizard. Replaces the
/// storefront's ambient token storage: whoever constructs the wizard decides
/// which identity (and which endpoint) the submission uses.
#[derive(Debug, Clone)]
pub enum Session {
  Registered { token: String },
  Guest,
}

impl Session {
  pub fn is_registered(&self) -> bool {
    matches!(self, Session::Registered { .. })
  }

  /// Bearer token for the authenticated endpoint; `None` for guests.
  pub fn bearer_token(&self) -> Option<&str> {
    match self {
      Session::Registered { token } => Some(token),
      Session::Guest => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CartLine {
  pub product_id: i64,
  pub name: String,
  pub price: f64,
  pub quantity: i64,
  pub selected_color: Option<String>,
}

// --- Submission payload (wire shape of POST /api/orders[/guest]) ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
  pub id: i64,
  pub price: f64,
  pub quantity: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub selected_color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsPayload {
  pub last_four: String,
  pub expiry: String,
  /// Brand detection never shipped; the client hardcodes it.
  pub brand: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfoPayload {
  pub email: String,
  pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
  pub items: Vec<OrderItemPayload>,
  pub subtotal: f64,
  pub discount: f64,
  pub shipping_cost: f64,
  pub total: f64,
  pub shipping_address: serde_json::Value,
  pub billing_address: serde_json::Value,
  pub payment_method: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_details: Option<PaymentDetailsPayload>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_info: Option<GuestInfoPayload>,
}

// --- Rule sets ---

const SHIPPING_FIELDS: &[&str] = &["fullName", "email", "phone", "address", "city", "state", "postalCode"];

pub fn shipping_rules() -> RuleSet {
  RuleSet::new()
    .field("fullName", FieldRules::new().required("Full name is required"))
    .field("email", FieldRules::new().required("Email is required").email())
    .field(
      "phone",
      FieldRules::new()
        .required("Phone number is required")
        .pattern(r"^\d{10}$", "Please enter a valid 10-digit phone number"),
    )
    .field("address", FieldRules::new().required("Address is required"))
    .field("city", FieldRules::new().required("City is required"))
    .field("state", FieldRules::new().required("State is required"))
    .field(
      "postalCode",
      FieldRules::new()
        .required("Postal code is required")
        .pattern(r"^\d{6}$", "Please enter a valid 6-digit postal code"),
    )
}

/// Card fields only apply when paying by card without a saved card selected.
fn card_details_needed(values: &Values) -> bool {
  let method = values.get("paymentMethod").map(String::as_str).unwrap_or("card");
  let saved = values.get("savedCard").map(String::as_str).unwrap_or("");
  method == "card" && saved.is_empty()
}

pub fn payment_rules() -> RuleSet {
  RuleSet::new()
    .field("paymentMethod", FieldRules::new().required("Payment method is required"))
    .field(
      "cardNumber",
      FieldRules::new()
        .required_when(card_details_needed, "Card number is required")
        .pattern(r"^\d{16}$", "Please enter a valid 16-digit card number"),
    )
    .field(
      "nameOnCard",
      FieldRules::new().required_when(card_details_needed, "Name on card is required"),
    )
    .field(
      "expiryDate",
      FieldRules::new()
        .required_when(card_details_needed, "Expiry date is required")
        .pattern(r"^(0[1-9]|1[0-2])/\d{2}$", "Please enter expiry as MM/YY"),
    )
    .field(
      "cvv",
      FieldRules::new()
        .required_when(card_details_needed, "CVV is required")
        .pattern(r"^\d{3,4}$", "Please enter a valid CVV"),
    )
}

// --- The wizard ---

pub struct CheckoutWizard {
  step: CheckoutStep,
  order_complete: bool,
  completed_order_number: Option<String>,
  cart: Vec<CartLine>,
  discount: f64,
  session: Session,
  same_as_shipping: bool,
  shipping_form: FormState,
  payment_form: FormState,
  shipping_rules: RuleSet,
  payment_rules: RuleSet,
}

impl CheckoutWizard {
  /// A wizard cannot exist over an empty cart; the storefront redirects
  /// away instead of rendering checkout.
  pub fn new(cart: Vec<CartLine>, session: Session) -> Result<Self, CheckoutError> {
    if cart.is_empty() {
      return Err(CheckoutError::EmptyCart);
    }
    let mut payment_form = FormState::new();
    payment_form.set_value("paymentMethod", "card");
    Ok(Self {
      step: CheckoutStep::Shipping,
      order_complete: false,
      completed_order_number: None,
      cart,
      discount: 0.0,
      session,
      same_as_shipping: true,
      shipping_form: FormState::new(),
      payment_form,
      shipping_rules: shipping_rules(),
      payment_rules: payment_rules(),
    })
  }

  pub fn step(&self) -> CheckoutStep {
    self.step
  }

  pub fn is_order_complete(&self) -> bool {
    self.order_complete
  }

  pub fn completed_order_number(&self) -> Option<&str> {
    self.completed_order_number.as_deref()
  }

  pub fn cart(&self) -> &[CartLine] {
    &self.cart
  }

  pub fn shipping_form(&self) -> &FormState {
    &self.shipping_form
  }

  pub fn payment_form(&self) -> &FormState {
    &self.payment_form
  }

  pub fn set_same_as_shipping(&mut self, same: bool) {
    self.same_as_shipping = same;
  }

  pub fn apply_discount(&mut self, discount: f64) {
    self.discount = discount;
  }

  /// Shipping edits mirror into the payment value bag so payment-step
  /// rules can read shipping fields as siblings.
  pub fn set_shipping_value(&mut self, name: &str, value: &str) {
    self.shipping_form.set_value(name, value);
    self.payment_form.set_value(name, value);
  }

  pub fn set_payment_value(&mut self, name: &str, value: &str) {
    self.payment_form.set_value(name, value);
  }

  pub fn blur_shipping(&mut self, name: &str) {
    let rules = self.shipping_rules.clone();
    self.shipping_form.blur(name, &rules);
  }

  /// shipping -> payment, gated on the shipping rules. Field errors stay
  /// on the shipping form when the transition is refused.
  pub fn proceed_to_payment(&mut self) -> bool {
    if self.step != CheckoutStep::Shipping {
      return false;
    }
    let rules = self.shipping_rules.clone();
    if self.shipping_form.validate_all(&rules) {
      self.step = CheckoutStep::Payment;
      true
    } else {
      false
    }
  }

  /// payment -> shipping, unconditional; payment values are preserved.
  pub fn back_to_shipping(&mut self) {
    if self.step == CheckoutStep::Payment {
      self.step = CheckoutStep::Shipping;
    }
  }

  pub fn subtotal(&self) -> f64 {
    self.cart.iter().map(|line| line.price * line.quantity as f64).sum()
  }

  pub fn shipping_cost(&self) -> f64 {
    pricing::shipping_cost(self.subtotal())
  }

  pub fn total(&self) -> f64 {
    self.subtotal() - self.discount + self.shipping_cost()
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  /// The endpoint this session submits to.
  pub fn submit_path(&self) -> &'static str {
    if self.session.is_registered() {
      "/api/orders"
    } else {
      "/api/orders/guest"
    }
  }

  fn shipping_address_json(&self) -> serde_json::Value {
    let mut address = serde_json::Map::new();
    for field in SHIPPING_FIELDS {
      address.insert((*field).to_string(), self.shipping_form.value(field).into());
    }
    serde_json::Value::Object(address)
  }

  /// Validates the payment step and composes the submission payload.
  ///
  /// With "same as shipping" unchecked the billing address is an empty
  /// object: the storefront offers the checkbox but never grew a separate
  /// billing form, and the gap is kept as-is.
  pub fn build_payload(&mut self) -> Result<OrderPayload, CheckoutError> {
    if self.step != CheckoutStep::Payment {
      return Err(CheckoutError::WrongStep(self.step));
    }
    let rules = self.payment_rules.clone();
    if !self.payment_form.validate_all(&rules) {
      return Err(CheckoutError::ValidationFailed);
    }

    let payment_method = self.payment_form.value("paymentMethod").to_string();
    let payment_details = if payment_method == "card" {
      let card_number = self.payment_form.value("cardNumber");
      let last_four = card_number.chars().rev().take(4).collect::<Vec<_>>();
      Some(PaymentDetailsPayload {
        last_four: last_four.into_iter().rev().collect(),
        expiry: self.payment_form.value("expiryDate").to_string(),
        brand: "Visa".to_string(),
      })
    } else {
      None
    };

    let shipping_address = self.shipping_address_json();
    let billing_address = if self.same_as_shipping {
      shipping_address.clone()
    } else {
      serde_json::json!({})
    };

    let user_info = if self.session.is_registered() {
      None
    } else {
      Some(GuestInfoPayload {
        email: self.shipping_form.value("email").to_string(),
        name: self.shipping_form.value("fullName").to_string(),
      })
    };

    Ok(OrderPayload {
      items: self
        .cart
        .iter()
        .map(|line| OrderItemPayload {
          id: line.product_id,
          price: line.price,
          quantity: line.quantity,
          selected_color: line.selected_color.clone(),
        })
        .collect(),
      subtotal: self.subtotal(),
      discount: self.discount,
      shipping_cost: self.shipping_cost(),
      total: self.total(),
      shipping_address,
      billing_address,
      payment_method,
      payment_details,
      user_info,
    })
  }

  /// payment -> complete, only on a server acknowledgment. The cart is
  /// cleared and is not restorable. The displayed number prefers the
  /// server's `orderNumber`; when the response lacks one a random local
  /// `ORD-` number is shown, which can diverge from the authoritative id.
  pub fn complete(&mut self, server_response: &serde_json::Value) -> Result<String, CheckoutError> {
    if self.step != CheckoutStep::Payment {
      return Err(CheckoutError::WrongStep(self.step));
    }
    let order_number = server_response
      .get("orderNumber")
      .and_then(|v| v.as_str())
      .map(str::to_string)
      .unwrap_or_else(fallback_order_number);

    self.order_complete = true;
    self.cart.clear();
    self.completed_order_number = Some(order_number.clone());
    Ok(order_number)
  }
}

fn fallback_order_number() -> String {
  let n = Uuid::new_v4().as_u128() % 900_000 + 100_000;
  format!("ORD-{}", n)
}
