// src/checkout/mod.rs

//! Client-side checkout flow: the two-step wizard state machine, its form
//! state, and the declarative validation rule engine the forms run on.

pub mod form;
pub mod rules;
pub mod wizard;

pub use form::FormState;
pub use rules::{FieldRules, Requirement, RuleSet, Values};
pub use wizard::{CartLine, CheckoutError, CheckoutStep, CheckoutWizard, Session};
