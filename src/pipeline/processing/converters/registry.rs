use std::collections::HashMap;

use super::{Converter, CsvToJsonConverter, SuperfundConverter, TriConverter, ViolationsConverter};
use crate::error::{ConvertError, Result};

/// Registry of the dataset converters, keyed by CLI name
pub struct ConverterRegistry {
    converters: HashMap<String, Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// Create a registry with the built-in converters
    pub fn new() -> Self {
        let mut registry = Self {
            converters: HashMap::new(),
        };
        registry.register(Box::new(TriConverter));
        registry.register(Box::new(SuperfundConverter));
        registry.register(Box::new(ViolationsConverter));
        registry.register(Box::new(CsvToJsonConverter));
        registry
    }

    pub fn register(&mut self, converter: Box<dyn Converter>) {
        self.converters.insert(converter.name().to_string(), converter);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Converter> {
        self.converters
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ConvertError::UnknownConverter(name.to_string()))
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
