use crate::domain::PluginProperty;

/// Turns repeated `pluginProperty=key=value` query values into plugin properties.
///
/// Only the first `=` separates key from value; a missing or empty value becomes `None`.
pub fn extract_plugin_properties<I>(raw: &[String], additional: I) -> Vec<PluginProperty>
where
    I: IntoIterator<Item = PluginProperty>,
{
    let mut properties: Vec<PluginProperty> = raw
        .iter()
        .filter_map(|entry| {
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (entry.as_str(), None),
            };
            if key.is_empty() {
                return None;
            }
            let value = value.filter(|v| !v.is_empty()).map(str::to_string);
            Some(PluginProperty::new(key, value))
        })
        .collect();
    properties.extend(additional);
    properties
}
