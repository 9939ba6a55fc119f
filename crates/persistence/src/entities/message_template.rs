//! Message template row mapping.
//!
//! One row per template and traffic type:
//! `PK = TEMPLATE#<id>`, `SK = METADATA#<traffic type key | DEFAULT>`.
//! Rows with a traffic type also carry the `GSI_PK`/`GSI_SK` pair that
//! places them in the traffic type index.

use domain::models::{MessageTemplate, TrafficType};

use crate::item::{string_attribute, AttributeValue, Item};
use crate::kv_store::{PARTITION_KEY, SORT_KEY};

pub const TEMPLATE_PREFIX: &str = "TEMPLATE#";
pub const METADATA_PREFIX: &str = "METADATA#";
pub const TRAFFIC_TYPE_PREFIX: &str = "TRAFFICTYPE#";
pub const DEFAULT_TRAFFIC_TYPE: &str = "DEFAULT";

pub const INDEX_PARTITION_KEY: &str = "GSI_PK";
pub const INDEX_SORT_KEY: &str = "GSI_SK";

const ID: &str = "id";
const KEY: &str = "key";
const NAME: &str = "name";
const SUBJECT: &str = "subject";
const BODY: &str = "body";
const PARAMETERS: &str = "parameters";
const TRAFFIC_TYPE_KEY: &str = "trafficTypeKey";
const TRAFFIC_TYPE_NAME: &str = "trafficTypeName";

/// Stored message template row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplateEntity {
    pub id: String,
    pub key: String,
    pub name: String,
    pub traffic_type_key: Option<String>,
    pub traffic_type_name: Option<String>,
    pub subject: String,
    pub body: String,
    pub parameters: Vec<String>,
}

/// Partition key value for a template id.
pub fn template_partition(id: &str) -> String {
    format!("{}{}", TEMPLATE_PREFIX, id)
}

/// Index partition key value for a traffic type key.
pub fn traffic_type_partition(key: &str) -> String {
    format!("{}{}", TRAFFIC_TYPE_PREFIX, key)
}

impl MessageTemplateEntity {
    pub fn sort_key(&self) -> String {
        format!(
            "{}{}",
            METADATA_PREFIX,
            self.traffic_type_key.as_deref().unwrap_or(DEFAULT_TRAFFIC_TYPE)
        )
    }

    pub fn into_item(self) -> Item {
        let mut item = Item::new();
        let mut put = |name: &str, value: String| {
            item.insert(name.to_string(), AttributeValue::S(value));
        };

        put(PARTITION_KEY, template_partition(&self.id));
        put(SORT_KEY, self.sort_key());

        if let Some(traffic_type_key) = &self.traffic_type_key {
            put(INDEX_PARTITION_KEY, traffic_type_partition(traffic_type_key));
            put(INDEX_SORT_KEY, template_partition(&self.id));
            put(TRAFFIC_TYPE_KEY, traffic_type_key.clone());
            put(
                TRAFFIC_TYPE_NAME,
                self.traffic_type_name.clone().unwrap_or_default(),
            );
        }

        put(ID, self.id);
        put(KEY, self.key);
        put(NAME, self.name);
        put(SUBJECT, self.subject);
        put(BODY, self.body);

        if !self.parameters.is_empty() {
            item.insert(PARAMETERS.to_string(), AttributeValue::Ss(self.parameters));
        }

        item
    }

    /// Reads a stored row. Returns the name of the first missing attribute on failure.
    pub fn try_from_item(item: &Item) -> Result<Self, &'static str> {
        let required = |name: &'static str| {
            string_attribute(item, name)
                .map(str::to_string)
                .ok_or(name)
        };

        let traffic_type_key = string_attribute(item, TRAFFIC_TYPE_KEY).map(str::to_string);
        let traffic_type_name = string_attribute(item, TRAFFIC_TYPE_NAME).map(str::to_string);

        Ok(Self {
            id: required(ID)?,
            key: required(KEY)?,
            name: required(NAME)?,
            traffic_type_key,
            traffic_type_name,
            subject: required(SUBJECT)?,
            body: required(BODY)?,
            parameters: item
                .get(PARAMETERS)
                .and_then(AttributeValue::as_ss)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
        })
    }
}

impl From<&MessageTemplate> for MessageTemplateEntity {
    fn from(template: &MessageTemplate) -> Self {
        Self {
            id: template.id.clone(),
            key: template.key.clone(),
            name: template.name.clone(),
            traffic_type_key: template.traffic_type.as_ref().map(|t| t.key.clone()),
            traffic_type_name: template.traffic_type.as_ref().map(|t| t.name.clone()),
            subject: template.subject.clone(),
            body: template.body.clone(),
            parameters: template.parameters.clone(),
        }
    }
}

impl From<MessageTemplateEntity> for MessageTemplate {
    fn from(entity: MessageTemplateEntity) -> Self {
        let traffic_type = entity
            .traffic_type_key
            .map(|key| TrafficType::new(key, entity.traffic_type_name.unwrap_or_default()));

        Self {
            id: entity.id,
            key: entity.key,
            name: entity.name,
            traffic_type,
            subject: entity.subject,
            body: entity.body,
            parameters: entity.parameters,
        }
    }
}
