//! Sweep configuration
//!
//! A [`ConfigSpace`] maps each parameter to its candidate values and
//! enumerates every fully-resolved [`Configuration`] in product order.

// Imports
use {
	crate::Error,
	itertools::Itertools,
	serde_json::Value,
	std::{cmp::Ordering, fmt, hash, iter},
};

/// Declares [`ParamName`] from the list of recognized parameters
macro_rules! param_names {
	($( $(#[$meta:meta])* $variant:ident => $name:literal, )*) => {
		/// Simulator parameter name.
		///
		/// Only [`ParamName::Size`] is special-cased when building commands,
		/// see [`crate::command`].
		#[derive(Clone, Debug)]
		pub enum ParamName {
			$( $(#[$meta])* $variant, )*

			/// Any other simulator parameter
			Custom(String),
		}

		impl ParamName {
			/// Returns the name as passed to the simulator
			#[must_use]
			pub fn as_str(&self) -> &str {
				match self {
					$( Self::$variant => $name, )*
					Self::Custom(name) => name,
				}
			}

			/// Parses a parameter name, recognizing the known parameters
			#[must_use]
			pub fn new(name: &str) -> Self {
				match name {
					$( $name => Self::$variant, )*
					_ => Self::Custom(name.to_owned()),
				}
			}
		}
	};
}

param_names! {
	/// Architecture simulated (`trax`, `dual-streaming`, ...)
	Simulator => "simulator",
	/// Architecture display name
	ArchName => "arch_name",
	/// Scene to render
	SceneName => "scene_name",
	/// Square framebuffer shorthand, expands to width and height
	Size => "size",
	FramebufferWidth => "framebuffer_width",
	FramebufferHeight => "framebuffer_height",
	PregenRays => "pregen_rays",
	PregenBounce => "pregen_bounce",
	/// Cycles between periodic log sections
	LoggingInterval => "logging_interval",
	TraversalScheme => "traversal_scheme",
	HitBufferSize => "hit_buffer_size",
	HitDelay => "hit_delay",
	UseEarly => "use_early",
	UseSceneBuffer => "use_scene_buffer",
	RaysOnChip => "rays_on_chip",
	WeightScheme => "weight_scheme",
	SecondaryRays => "secondary_rays",
}

impl PartialEq for ParamName {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for ParamName {}

impl PartialOrd for ParamName {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ParamName {
	fn cmp(&self, other: &Self) -> Ordering {
		self.as_str().cmp(other.as_str())
	}
}

impl hash::Hash for ParamName {
	fn hash<H: hash::Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl fmt::Display for ParamName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for ParamName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for ParamName {
	fn from(name: String) -> Self {
		Self::new(&name)
	}
}

impl serde::Serialize for ParamName {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

/// Resolved parameter value
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
	Str(String),
	Int(i64),
	Float(f64),
}

impl ParamValue {
	/// Converts a json value.
	///
	/// Only strings and numbers are representable.
	pub fn from_json(value: &Value) -> Result<Self, Error> {
		match value {
			Value::String(value) => Ok(Self::Str(value.clone())),
			Value::Number(number) => match (number.as_i64(), number.as_f64()) {
				(Some(value), _) => Ok(Self::Int(value)),
				(None, Some(value)) if value.is_finite() => Ok(Self::Float(value)),
				_ => Err(Error::UnserializableConfig(format!("unsupported number {number}"))),
			},
			_ => Err(Error::UnserializableConfig(format!(
				"expected a string or a number, found {value}"
			))),
		}
	}
}

impl fmt::Display for ParamValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Str(value) => f.write_str(value),
			Self::Int(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value:?}"),
		}
	}
}

impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_owned())
	}
}

impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<i64> for ParamValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<f64> for ParamValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

/// Fully-resolved configuration.
///
/// Each parameter appears at most once. Insertion order is kept, since it
/// dictates the order of the simulator flags.
#[derive(Clone, Debug, Default)]
#[derive(serde::Serialize)]
pub struct Configuration {
	params: Vec<(ParamName, ParamValue)>,
}

impl Configuration {
	/// Creates an empty configuration
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a parameter, returning the previous value.
	///
	/// Replacing a parameter keeps its original position.
	pub fn insert(&mut self, name: impl Into<ParamName>, value: impl Into<ParamValue>) -> Option<ParamValue> {
		let name = name.into();
		let value = value.into();
		match self.params.iter_mut().find(|(cur_name, _)| *cur_name == name) {
			Some((_, cur_value)) => Some(std::mem::replace(cur_value, value)),
			None => {
				self.params.push((name, value));
				None
			},
		}
	}

	/// Builder-style [`Self::insert`]
	#[must_use]
	pub fn with(mut self, name: impl Into<ParamName>, value: impl Into<ParamValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Returns a parameter's value
	pub fn get(&self, name: &str) -> Option<&ParamValue> {
		self.params
			.iter()
			.find(|(cur_name, _)| cur_name.as_str() == name)
			.map(|(_, value)| value)
	}

	/// Iterates over all parameters in insertion order
	pub fn iter(&self) -> impl Iterator<Item = (&ParamName, &ParamValue)> {
		self.params.iter().map(|(name, value)| (name, value))
	}

	/// Returns all parameters sorted by name
	pub fn sorted(&self) -> Vec<(&ParamName, &ParamValue)> {
		self.iter().sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs)).collect()
	}

	/// Returns the number of parameters
	pub fn len(&self) -> usize {
		self.params.len()
	}

	/// Returns if there are no parameters
	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Parses a configuration from a json object
	pub fn from_json(value: &Value) -> Result<Self, Error> {
		let object = value
			.as_object()
			.ok_or_else(|| Error::UnserializableConfig(format!("expected an object, found {value}")))?;

		object.iter().try_fold(Self::new(), |config, (name, value)| {
			let value = ParamValue::from_json(value)?;
			Ok(config.with(name.as_str(), value))
		})
	}
}

/// Configurations are equal if they hold the same parameters, in any order
impl PartialEq for Configuration {
	fn eq(&self, other: &Self) -> bool {
		self.sorted() == other.sorted()
	}
}

impl fmt::Display for Configuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let params = self.iter().map(|(name, value)| format!("{name}={value}")).join(" ");
		f.write_str(&params)
	}
}

/// Sweep definition: each parameter with its ordered candidate values
#[derive(Clone, Debug, Default)]
pub struct ConfigSpace {
	params: Vec<(ParamName, Vec<String>)>,
}

impl ConfigSpace {
	/// Creates an empty space
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a parameter with its candidates.
	///
	/// # Errors
	/// Returns [`Error::InvalidConfigSpace`] if the name is empty, malformed or
	/// already present.
	pub fn with_param<S: Into<String>>(
		mut self,
		name: &str,
		values: impl IntoIterator<Item = S>,
	) -> Result<Self, Error> {
		if name.is_empty() {
			return Err(Error::invalid_space("<empty>", "parameter names must not be empty"));
		}
		if name.contains(|ch: char| ch == '=' || ch.is_whitespace()) {
			return Err(Error::invalid_space(
				name,
				"parameter names must not contain `=` or whitespace",
			));
		}

		let name = ParamName::new(name);
		if self.params.iter().any(|(cur_name, _)| *cur_name == name) {
			return Err(Error::invalid_space(name.as_str(), "duplicate parameter"));
		}

		self.params.push((name, values.into_iter().map(Into::into).collect()));
		Ok(self)
	}

	/// Parses a space from a json object of string arrays.
	///
	/// The whole object is validated before returning.
	pub fn from_json(value: &Value) -> Result<Self, Error> {
		let object = value
			.as_object()
			.ok_or_else(|| Error::invalid_space("<root>", format!("expected an object, found {value}")))?;

		object.iter().try_fold(Self::new(), |space, (name, values)| {
			let values = values.as_array().ok_or_else(|| {
				Error::invalid_space(name.as_str(), format!("expected a list of strings, found {values}"))
			})?;
			let values = values
				.iter()
				.enumerate()
				.map(|(idx, value)| match value {
					Value::String(value) => Ok(value.as_str()),
					_ => Err(Error::invalid_space(
						format!("{name}[{idx}]"),
						format!("expected a string, found {value}"),
					)),
				})
				.collect::<Result<Vec<_>, _>>()?;

			space.with_param(name, values)
		})
	}

	/// Returns all parameters with their candidates
	pub fn params(&self) -> impl Iterator<Item = (&ParamName, &[String])> {
		self.params.iter().map(|(name, values)| (name, values.as_slice()))
	}

	/// Returns the number of configurations in this space
	pub fn size(&self) -> usize {
		self.params.iter().map(|(_, values)| values.len()).product()
	}

	/// Replaces the candidates of an existing parameter
	pub fn restrict<S: Into<String>>(&mut self, name: &str, values: impl IntoIterator<Item = S>) -> Result<(), Error> {
		let (_, cur_values) = self
			.params
			.iter_mut()
			.find(|(cur_name, _)| cur_name.as_str() == name)
			.ok_or_else(|| Error::invalid_space(name, "unknown parameter"))?;
		*cur_values = values.into_iter().map(Into::into).collect();

		Ok(())
	}

	/// Lazily enumerates every configuration.
	///
	/// The last parameter varies fastest. A parameter without candidates
	/// yields no configurations at all.
	pub fn configurations(&self) -> impl Iterator<Item = Configuration> + '_ {
		let combinations: Box<dyn Iterator<Item = Vec<&String>> + '_> = match self.params.as_slice() {
			[] => Box::new(iter::once(vec![])),
			params if params.iter().any(|(_, values)| values.is_empty()) => Box::new(iter::empty()),
			params => Box::new(
				params
					.iter()
					.map(|(_, values)| values.iter())
					.multi_cartesian_product(),
			),
		};

		combinations.map(move |combination| Configuration {
			params: self
				.params
				.iter()
				.zip(combination)
				.map(|((name, _), value)| (name.clone(), ParamValue::Str(value.clone())))
				.collect(),
		})
	}
}

#[cfg(test)]
mod tests {
	use {super::*, serde_json::json, std::collections::HashSet};

	fn space() -> ConfigSpace {
		ConfigSpace::new()
			.with_param("simulator", ["trax", "dual-streaming"])
			.and_then(|space| space.with_param("scene_name", ["sponza", "san-miguel", "hairball"]))
			.and_then(|space| space.with_param("size", ["128", "1024"]))
			.expect("valid space")
	}

	#[test]
	fn enumerates_full_product_in_order() {
		let space = space();
		let configs = space.configurations().collect::<Vec<_>>();
		assert_eq!(configs.len(), 2 * 3 * 2);
		assert_eq!(space.size(), configs.len());

		let rendered = configs.iter().map(Configuration::to_string).collect::<Vec<_>>();
		assert_eq!(rendered[0], "simulator=trax scene_name=sponza size=128");
		assert_eq!(rendered[1], "simulator=trax scene_name=sponza size=1024");
		assert_eq!(rendered[2], "simulator=trax scene_name=san-miguel size=128");
		assert_eq!(rendered[11], "simulator=dual-streaming scene_name=hairball size=1024");

		let unique = rendered.iter().collect::<HashSet<_>>();
		assert_eq!(unique.len(), configs.len());
	}

	#[test]
	fn empty_candidates_yield_nothing() {
		let space = space().with_param("pregen_bounce", Vec::<String>::new()).expect("valid space");
		assert_eq!(space.configurations().count(), 0);
		assert_eq!(space.size(), 0);
	}

	#[test]
	fn no_params_yield_single_empty_configuration() {
		let configs = ConfigSpace::new().configurations().collect::<Vec<_>>();
		assert_eq!(configs.len(), 1);
		assert!(configs[0].is_empty());
	}

	#[test]
	fn json_space_keeps_file_order() {
		let space = ConfigSpace::from_json(&json!({
			"size": ["512"],
			"scene_name": ["sponza", "sibenik"],
		}))
		.expect("valid space");

		let names = space.params().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
		assert_eq!(names, ["size", "scene_name"]);
		assert!(matches!(space.params().next(), Some((ParamName::Size, _))));
	}

	#[test]
	fn json_space_rejects_malformed_entries() {
		let err = ConfigSpace::from_json(&json!({ "size": "512" })).expect_err("non-list value");
		assert!(matches!(err, Error::InvalidConfigSpace { ref location, .. } if location == "size"));

		let err = ConfigSpace::from_json(&json!({ "scene_name": ["sponza"], "size": ["128", 1024] }))
			.expect_err("non-string element");
		assert!(matches!(err, Error::InvalidConfigSpace { ref location, .. } if location == "size[1]"));

		let err = ConfigSpace::from_json(&json!(["size"])).expect_err("non-object root");
		assert!(matches!(err, Error::InvalidConfigSpace { .. }));
	}

	#[test]
	fn duplicate_and_malformed_names_are_rejected() {
		assert!(space().with_param("size", ["1"]).is_err());
		assert!(ConfigSpace::new().with_param("", ["1"]).is_err());
		assert!(ConfigSpace::new().with_param("a=b", ["1"]).is_err());
	}

	#[test]
	fn restrict_replaces_candidates() {
		let mut space = space();
		space.restrict("size", ["1024"]).expect("known parameter");
		assert_eq!(space.size(), 6);
		assert!(space.restrict("unknown", ["1"]).is_err());
	}

	#[test]
	fn configuration_equality_ignores_order() {
		let lhs = Configuration::new().with("a", "1").with("b", 2_i64);
		let rhs = Configuration::new().with("b", 2_i64).with("a", "1");
		assert_eq!(lhs, rhs);
		assert_ne!(lhs, rhs.with("a", "2"));
	}

	#[test]
	fn configuration_insert_replaces_in_place() {
		let mut config = Configuration::new().with("scene_name", "sponza").with("size", "128");
		assert_eq!(config.insert("scene_name", "san-miguel"), Some(ParamValue::from("sponza")));
		assert_eq!(config.to_string(), "scene_name=san-miguel size=128");
		assert_eq!(config.len(), 2);
	}

	#[test]
	fn configuration_from_json_rejects_nested_values() {
		let config = Configuration::from_json(&json!({ "size": 512, "scene_name": "sponza" })).expect("flat object");
		assert_eq!(config.get("size"), Some(&ParamValue::Int(512)));

		let err = Configuration::from_json(&json!({ "size": [512] })).expect_err("nested value");
		assert!(matches!(err, Error::UnserializableConfig(_)));
	}

	#[test]
	fn known_names_are_recognized() {
		assert_eq!(ParamName::new("size"), ParamName::Size);
		assert!(matches!(ParamName::new("hit_delay"), ParamName::HitDelay));
		assert!(matches!(ParamName::new("bogus"), ParamName::Custom(ref name) if name == "bogus"));
		assert_eq!(ParamName::Custom("size".to_owned()), ParamName::Size);
	}
}
