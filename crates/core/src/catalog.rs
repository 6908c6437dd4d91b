//! Type-selector registry for installable models.

use crate::{Model, NetlistError};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Constructor for a fresh model instance.
pub type ModelFactory = fn() -> Box<dyn Model>;

/// Maps type selectors to model constructors.
///
/// Factories are validated when they are registered, so an install can only
/// fail on an unknown selector, never on a malformed model.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    factories: BTreeMap<String, ModelFactory>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `selector`.
    ///
    /// Fails if the selector is taken, or if the model it builds declares no
    /// pins or the same pin name twice.
    pub fn register(
        &mut self,
        selector: impl Into<String>,
        factory: ModelFactory,
    ) -> Result<(), NetlistError> {
        let selector = selector.into();
        if self.factories.contains_key(&selector) {
            return Err(NetlistError::DuplicateModelType(selector));
        }

        let pins = factory().pins();
        if pins.is_empty() {
            return Err(NetlistError::InvalidModel {
                selector,
                reason: "model declares no pins".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for spec in &pins {
            if !seen.insert(spec.name.as_str()) {
                return Err(NetlistError::InvalidModel {
                    selector,
                    reason: format!("pin '{}' declared twice", spec.name),
                });
            }
        }

        debug!(selector = %selector, pins = pins.len(), "Registered model type");
        self.factories.insert(selector, factory);
        Ok(())
    }

    /// Build a new model for `selector`.
    pub fn create(&self, selector: &str) -> Result<Box<dyn Model>, NetlistError> {
        self.factories
            .get(selector)
            .map(|factory| factory())
            .ok_or_else(|| NetlistError::UnknownModelType(selector.to_string()))
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.factories.contains_key(selector)
    }

    /// Registered selectors in sorted order.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Levels, PinSpec};

    #[derive(Debug)]
    struct Fixed(Vec<PinSpec>);

    impl Model for Fixed {
        fn kind(&self) -> &str {
            "fixed"
        }
        fn pins(&self) -> Vec<PinSpec> {
            self.0.clone()
        }
        fn evaluate(&mut self, _inputs: &Levels) -> Levels {
            Levels::new()
        }
        fn reset(&mut self) {}
    }

    fn good() -> Box<dyn Model> {
        Box::new(Fixed(vec![PinSpec::input("a"), PinSpec::output("y")]))
    }

    fn no_pins() -> Box<dyn Model> {
        Box::new(Fixed(vec![]))
    }

    fn twice() -> Box<dyn Model> {
        Box::new(Fixed(vec![PinSpec::input("a"), PinSpec::output("a")]))
    }

    #[test]
    fn test_register_and_create() {
        let mut catalog = ModelCatalog::new();
        catalog.register("fixed", good).unwrap();
        assert!(catalog.contains("fixed"));
        assert_eq!(catalog.create("fixed").unwrap().pins().len(), 2);
        assert!(matches!(
            catalog.create("missing"),
            Err(NetlistError::UnknownModelType(_))
        ));
    }

    #[test]
    fn test_registration_is_validated() {
        let mut catalog = ModelCatalog::new();
        catalog.register("fixed", good).unwrap();
        assert_eq!(
            catalog.register("fixed", good),
            Err(NetlistError::DuplicateModelType("fixed".to_string()))
        );
        assert!(matches!(
            catalog.register("empty", no_pins),
            Err(NetlistError::InvalidModel { .. })
        ));
        assert!(matches!(
            catalog.register("twice", twice),
            Err(NetlistError::InvalidModel { .. })
        ));
        assert_eq!(catalog.selectors().collect::<Vec<_>>(), vec!["fixed"]);
    }
}
