//! Mapping between `TodoItem` and DynamoDB attribute maps.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use domain::timestamp::millis_from_seconds_str;
use domain::{StoreError, TodoId, TodoItem};

pub(crate) const ATTR_ID: &str = "id";
pub(crate) const ATTR_TEXT: &str = "text";
pub(crate) const ATTR_CHECKED: &str = "checked";
pub(crate) const ATTR_CREATED_AT: &str = "createdAt";
pub(crate) const ATTR_UPDATED_AT: &str = "updatedAt";

pub(crate) fn key_value(id: &TodoId) -> AttributeValue {
    AttributeValue::S(id.as_str().to_string())
}

pub(crate) fn todo_to_item(todo: &TodoItem) -> HashMap<String, AttributeValue> {
    let mut m = HashMap::new();
    m.insert(ATTR_ID.into(), key_value(&todo.id));
    m.insert(ATTR_TEXT.into(), AttributeValue::S(todo.text.clone()));
    m.insert(ATTR_CHECKED.into(), AttributeValue::Bool(todo.checked));
    m.insert(ATTR_CREATED_AT.into(), AttributeValue::S(todo.created_at.clone()));
    m.insert(ATTR_UPDATED_AT.into(), AttributeValue::N(todo.updated_at.to_string()));
    m
}

pub(crate) fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<TodoItem, StoreError> {
    let id = item
        .get(ATTR_ID)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::MalformedItem("item missing id".into()))?;
    let id = TodoId::new(id.to_string())
        .map_err(|e| StoreError::MalformedItem(format!("bad id in item: {e}")))?;
    let text = item
        .get(ATTR_TEXT)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::MalformedItem(format!("item {id} missing text")))?
        .to_string();
    let created_at = item
        .get(ATTR_CREATED_AT)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::MalformedItem(format!("item {id} missing createdAt")))?
        .to_string();

    let checked = item
        .get(ATTR_CHECKED)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .unwrap_or(false);

    // Records written before the first update may carry a seconds string
    let updated_at = match item.get(ATTR_UPDATED_AT) {
        Some(AttributeValue::N(n)) => n.parse::<u64>().ok(),
        Some(AttributeValue::S(s)) => millis_from_seconds_str(s),
        _ => None,
    }
    .ok_or_else(|| StoreError::MalformedItem(format!("item {id} has bad updatedAt")))?;

    Ok(TodoItem {
        id,
        text,
        checked,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TodoItem {
        TodoItem {
            id: TodoId::new("0190b2c4-7e1a-7000-8000-000000000001").unwrap(),
            text: "Aprender DevOps".into(),
            checked: false,
            created_at: "1700000000.250000".into(),
            updated_at: 1_700_000_000_250,
        }
    }

    #[test]
    fn item_uses_wire_attribute_types() {
        let item = todo_to_item(&sample());
        assert_eq!(item.len(), 5);
        assert!(matches!(item.get("id"), Some(AttributeValue::S(_))));
        assert_eq!(item.get("checked"), Some(&AttributeValue::Bool(false)));
        assert_eq!(
            item.get("updatedAt"),
            Some(&AttributeValue::N("1700000000250".into()))
        );
        assert_eq!(item_to_todo(&item).unwrap(), sample());
    }

    #[test]
    fn legacy_item_with_string_updated_at() {
        let mut item = HashMap::new();
        item.insert("id".into(), AttributeValue::S("legacy".into()));
        item.insert("text".into(), AttributeValue::S("old".into()));
        item.insert("checked".into(), AttributeValue::Bool(false));
        item.insert("createdAt".into(), AttributeValue::S("1600000000.123456".into()));
        item.insert("updatedAt".into(), AttributeValue::S("1600000000.123456".into()));

        let todo = item_to_todo(&item).unwrap();
        assert_eq!(todo.created_at, "1600000000.123456");
        assert_eq!(todo.updated_at, 1_600_000_000_123);
    }

    #[test]
    fn missing_checked_defaults_to_false() {
        let mut item = todo_to_item(&sample());
        item.remove("checked");
        assert!(!item_to_todo(&item).unwrap().checked);
    }

    #[test]
    fn rejects_items_without_required_fields() {
        let mut item = todo_to_item(&sample());
        item.remove("text");
        assert!(matches!(item_to_todo(&item), Err(StoreError::MalformedItem(_))));

        let mut item = todo_to_item(&sample());
        item.insert("id".into(), AttributeValue::S(String::new()));
        assert!(matches!(item_to_todo(&item), Err(StoreError::MalformedItem(_))));

        let mut item = todo_to_item(&sample());
        item.insert("updatedAt".into(), AttributeValue::Bool(true));
        assert!(matches!(item_to_todo(&item), Err(StoreError::MalformedItem(_))));
    }
}
