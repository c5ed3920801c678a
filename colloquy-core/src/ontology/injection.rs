//! Vocabulary injection: requests that extend entity values at runtime, the
//! completion event, and component reload notifications.

use std::collections::HashMap;
use std::os::raw::c_int;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};
use crate::ffi::types::*;
use crate::ffi::{
    read_opt_string, read_string, read_string_map, BoxedGuard, CStringGuard, PtrArrayGuard,
    StringMapGuard,
};

/// How injected values combine with what the entity already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionKind {
    /// Add on top of the current entity values, previous injections included.
    Add,
    /// Reset the entity to its assistant-built state, then add.
    AddFromVanilla,
}

impl InjectionKind {
    pub(crate) fn from_c(raw: c_int) -> Result<Self> {
        match raw {
            INJECTION_KIND_ADD => Ok(Self::Add),
            INJECTION_KIND_ADD_FROM_VANILLA => Ok(Self::AddFromVanilla),
            other => Err(ColloquyError::Protocol(format!(
                "unknown injection kind discriminant {other}"
            ))),
        }
    }

    pub(crate) fn to_c(self) -> c_int {
        match self {
            Self::Add => INJECTION_KIND_ADD,
            Self::AddFromVanilla => INJECTION_KIND_ADD_FROM_VANILLA,
        }
    }
}

/// One injection step: entity name → new values, applied with `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionRequestOperation {
    pub entities: HashMap<String, Vec<String>>,
    pub kind: InjectionKind,
}

/// A batch of injection operations, applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionRequestMessage {
    pub operations: Vec<InjectionRequestOperation>,
    /// Pronunciation overrides: word → phoneme spellings.
    pub lexicon: HashMap<String, Vec<String>>,
    /// Language for generated pronunciations when it differs from the
    /// assistant's.
    pub cross_language: Option<String>,
    /// Echoed back in the completion event.
    pub request_id: Option<String>,
}

impl InjectionRequestMessage {
    pub(crate) fn with_c_repr<T>(
        &self,
        body: impl FnOnce(*const CInjectionRequestMessage) -> Result<T>,
    ) -> Result<T> {
        let mut values = Vec::with_capacity(self.operations.len());
        let mut entries = Vec::with_capacity(self.operations.len());
        for operation in &self.operations {
            let map = StringMapGuard::new(&operation.entities)?;
            entries.push(BoxedGuard::new(CInjectionRequestOperation {
                values: map.as_ptr(),
                kind: operation.kind.to_c(),
            }));
            values.push(map);
        }
        let ptrs = PtrArrayGuard::new(entries.iter().map(|e| e.as_ptr()).collect());
        let operations = BoxedGuard::new(CInjectionRequestOperations {
            operations: ptrs.as_ptr(),
            count: entries.len() as c_int,
        });
        let lexicon = StringMapGuard::new(&self.lexicon)?;
        let cross_language = CStringGuard::new(self.cross_language.as_deref())?;
        let request_id = CStringGuard::new(self.request_id.as_deref())?;
        let message = CInjectionRequestMessage {
            operations: operations.as_ptr(),
            lexicon: lexicon.as_ptr(),
            cross_language: cross_language.as_ptr(),
            id: request_id.as_ptr(),
        };
        body(&message)
    }

    pub(crate) unsafe fn from_c(raw: &CInjectionRequestMessage) -> Result<Self> {
        let mut operations = Vec::new();
        if !raw.operations.is_null() {
            let list = &*raw.operations;
            operations.reserve(list.count as usize);
            for i in 0..list.count as usize {
                let operation = *list.operations.add(i);
                if operation.is_null() {
                    return Err(ColloquyError::Protocol("null injection operation".into()));
                }
                let operation = &*operation;
                operations.push(InjectionRequestOperation {
                    entities: read_string_map(operation.values)?,
                    kind: InjectionKind::from_c(operation.kind)?,
                });
            }
        }
        Ok(Self {
            operations,
            lexicon: read_string_map(raw.lexicon)?,
            cross_language: read_opt_string(raw.cross_language),
            request_id: read_opt_string(raw.id),
        })
    }
}

/// Emitted exactly once per accepted injection request, after the engine has
/// rebuilt its models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionCompleteMessage {
    pub request_id: Option<String>,
}

impl InjectionCompleteMessage {
    pub(crate) unsafe fn from_c(raw: &CInjectionCompleteMessage) -> Result<Self> {
        Ok(Self {
            request_id: read_opt_string(raw.request_id),
        })
    }
}

/// A component finished (re)loading its models, e.g. after an injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLoadedMessage {
    pub component: String,
}

impl ComponentLoadedMessage {
    pub(crate) unsafe fn from_c(raw: &CComponentLoadedMessage) -> Result<Self> {
        Ok(Self {
            component: read_string(raw.component)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injection_request_round_trips_through_c() {
        let mut entities = HashMap::new();
        entities.insert(
            "locality".to_string(),
            vec!["wonderland".to_string(), "oz".to_string()],
        );
        let mut lexicon = HashMap::new();
        lexicon.insert("oz".to_string(), vec!["Oh z".to_string()]);
        let message = InjectionRequestMessage {
            operations: vec![
                InjectionRequestOperation {
                    entities: entities.clone(),
                    kind: InjectionKind::AddFromVanilla,
                },
                InjectionRequestOperation {
                    entities,
                    kind: InjectionKind::Add,
                },
            ],
            lexicon,
            cross_language: Some("en".into()),
            request_id: Some("req-1".into()),
        };
        let decoded = message
            .with_c_repr(|raw| unsafe { InjectionRequestMessage::from_c(&*raw) })
            .unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn unknown_injection_kind_is_a_protocol_error() {
        assert!(matches!(
            InjectionKind::from_c(9).unwrap_err(),
            ColloquyError::Protocol(_)
        ));
    }
}
