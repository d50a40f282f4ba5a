//! Checkout form state: the order draft and its validation map.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use larek_core::{DomainError, ValueObject};

/// One input of the checkout forms.
///
/// Declaration order is the order validation messages are listed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderField {
    Payment,
    Address,
    Email,
    Phone,
}

impl OrderField {
    pub const ALL: [OrderField; 4] = [
        OrderField::Payment,
        OrderField::Address,
        OrderField::Email,
        OrderField::Phone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderField::Payment => "payment",
            OrderField::Address => "address",
            OrderField::Email => "email",
            OrderField::Phone => "phone",
        }
    }

    pub fn section(self) -> FormSection {
        match self {
            OrderField::Payment | OrderField::Address => FormSection::Order,
            OrderField::Email | OrderField::Phone => FormSection::Contacts,
        }
    }

    /// Topic a view publishes when the user edits this field.
    pub fn change_topic(self) -> &'static str {
        match self {
            OrderField::Payment => "order.payment:change",
            OrderField::Address => "order.address:change",
            OrderField::Email => "contacts.email:change",
            OrderField::Phone => "contacts.phone:change",
        }
    }

    pub fn required_message(self) -> &'static str {
        match self {
            OrderField::Payment => "payment required",
            OrderField::Address => "address required",
            OrderField::Email => "email required",
            OrderField::Phone => "phone required",
        }
    }
}

impl core::fmt::Display for OrderField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| DomainError::unknown_field(s))
    }
}

/// The two checkout steps: delivery/payment first, then contacts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormSection {
    Order,
    Contacts,
}

impl FormSection {
    pub fn fields(self) -> [OrderField; 2] {
        match self {
            FormSection::Order => [OrderField::Address, OrderField::Payment],
            FormSection::Contacts => [OrderField::Email, OrderField::Phone],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormSection::Order => "order",
            FormSection::Contacts => "contacts",
        }
    }
}

/// In-progress checkout input. Every field starts as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    payment: String,
    address: String,
    email: String,
    phone: String,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: OrderField) -> &str {
        match field {
            OrderField::Payment => &self.payment,
            OrderField::Address => &self.address,
            OrderField::Email => &self.email,
            OrderField::Phone => &self.phone,
        }
    }

    pub fn set(&mut self, field: OrderField, value: impl Into<String>) {
        let value = value.into();
        match field {
            OrderField::Payment => self.payment = value,
            OrderField::Address => self.address = value,
            OrderField::Email => self.email = value,
            OrderField::Phone => self.phone = value,
        }
    }

    pub fn with(mut self, field: OrderField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn payment(&self) -> &str {
        &self.payment
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn is_empty(&self) -> bool {
        OrderField::ALL.into_iter().all(|field| self.get(field).is_empty())
    }

    /// Full validation pass: one error per empty field, nothing else.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in OrderField::ALL {
            if self.get(field).is_empty() {
                errors.insert(field, field.required_message());
            }
        }
        errors
    }
}

impl ValueObject for OrderDraft {}

/// Field -> message. A missing key means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<OrderField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: OrderField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: OrderField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: OrderField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = OrderField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderField, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Whether every field of `section` is free of errors.
    pub fn section_valid(&self, section: FormSection) -> bool {
        section.fields().into_iter().all(|field| !self.contains(field))
    }

    /// Messages for `section`, joined for display under the form.
    pub fn joined(&self, section: FormSection) -> String {
        section
            .fields()
            .into_iter()
            .filter_map(|field| self.get(field))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl ValueObject for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_has_an_error_for_every_field() {
        let errors = OrderDraft::new().validate();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(OrderField::Payment), Some("payment required"));
        assert_eq!(errors.get(OrderField::Address), Some("address required"));
        assert_eq!(errors.get(OrderField::Email), Some("email required"));
        assert_eq!(errors.get(OrderField::Phone), Some("phone required"));
    }

    #[test]
    fn filled_draft_is_valid() {
        let draft = OrderDraft::new()
            .with(OrderField::Payment, "card")
            .with(OrderField::Address, "Moscow")
            .with(OrderField::Email, "test@test.ru")
            .with(OrderField::Phone, "+71234567890");

        assert!(draft.validate().is_empty());
        assert!(!draft.is_empty());
    }

    #[test]
    fn sections_split_messages() {
        let draft = OrderDraft::new().with(OrderField::Payment, "cash");
        let errors = draft.validate();

        assert!(!errors.section_valid(FormSection::Order));
        assert_eq!(errors.joined(FormSection::Order), "address required");
        assert_eq!(errors.joined(FormSection::Contacts), "email required; phone required");

        let errors = draft
            .with(OrderField::Address, "Moscow")
            .validate();
        assert!(errors.section_valid(FormSection::Order));
        assert_eq!(errors.joined(FormSection::Order), "");
    }

    #[test]
    fn parses_field_names() {
        assert_eq!("email".parse::<OrderField>().unwrap(), OrderField::Email);
        assert_eq!(
            "total".parse::<OrderField>().unwrap_err(),
            DomainError::UnknownField("total".to_string())
        );
    }

    #[test]
    fn change_topics_follow_sections() {
        for field in OrderField::ALL {
            let topic = field.change_topic();
            assert!(topic.starts_with(field.section().as_str()));
            assert!(topic.contains(field.as_str()));
        }
    }

    #[test]
    fn errors_serialize_as_field_map() {
        let errors = OrderDraft::new()
            .with(OrderField::Payment, "card")
            .with(OrderField::Address, "Moscow")
            .validate();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "email required", "phone": "phone required"})
        );
    }
}
