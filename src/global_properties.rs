//! Run-wide immutable values, such as the parsed simulation parameters.
//!
//! A global property is declared with [`define_global_property!`], which creates a zero-sized key
//! type bound to a value type. The value is set once, usually straight after it is read from a
//! JSON file with [`ContextGlobalPropertiesExt::load_parameters_from_json`], and read back by
//! reference from anywhere that holds the context.
use std::any::{Any, TypeId};
use std::fs;
use std::path::Path;

use log::trace;
use rustc_hash::FxHashMap as HashMap;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::SimError;

/// Defines a global property key type `$global_property` holding a `$value`.
#[macro_export]
macro_rules! define_global_property {
    ($global_property:ident, $value:ty) => {
        #[derive(Copy, Clone)]
        pub struct $global_property;

        impl $crate::global_properties::GlobalProperty for $global_property {
            type Value = $value;

            fn name() -> &'static str {
                stringify!($global_property)
            }
        }
    };
}
pub use define_global_property;

pub trait GlobalProperty: Any {
    type Value: Any;

    fn name() -> &'static str;
}

#[derive(Default)]
struct GlobalPropertiesDataContainer {
    values: HashMap<TypeId, Box<dyn Any>>,
}

define_data_plugin!(
    GlobalPropertiesPlugin,
    GlobalPropertiesDataContainer,
    GlobalPropertiesDataContainer::default()
);

pub trait ContextGlobalPropertiesExt {
    /// Sets the value of a global property.
    ///
    /// # Errors
    ///
    /// Returns `SimError::SimError` if the property already has a value.
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        property: T,
        value: T::Value,
    ) -> Result<(), SimError>;

    /// Returns the value of a global property, or `None` if it was never set.
    fn get_global_property_value<T: GlobalProperty>(&self, property: T) -> Option<&T::Value>;

    /// Reads a JSON file and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::IoError` if the file cannot be read and `SimError::JsonError` if it
    /// does not deserialize into `T`.
    fn load_parameters_from_json<T: DeserializeOwned>(&self, file_path: &Path)
        -> Result<T, SimError>;
}

impl ContextGlobalPropertiesExt for Context {
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        _property: T,
        value: T::Value,
    ) -> Result<(), SimError> {
        trace!("setting global property {}", T::name());
        let container = self.get_data_mut(GlobalPropertiesPlugin);
        if container.values.contains_key(&TypeId::of::<T>()) {
            return Err(SimError::SimError(format!(
                "global property {} is already set",
                T::name()
            )));
        }
        container.values.insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    fn get_global_property_value<T: GlobalProperty>(&self, _property: T) -> Option<&T::Value> {
        self.get_data(GlobalPropertiesPlugin)?
            .values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T::Value>())
    }

    fn load_parameters_from_json<T: DeserializeOwned>(
        &self,
        file_path: &Path,
    ) -> Result<T, SimError> {
        trace!("loading parameters from {}", file_path.display());
        let text = fs::read_to_string(file_path)?;
        let value = serde_json::from_str(&text)?;
        Ok(value)
    }
}
