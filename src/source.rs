// src/source.rs
//
// Buried spherical mass anomalies and the ordered registry that holds them.
//
// Conventions:
// - x, y are horizontal surface coordinates (m)
// - z is depth of the sphere centre below the surface (m, positive down)
// - rho is the density contrast (kg/m^3), signed
//
// The sphere radius is not stored per source; it is shared by all sources
// in one evaluation (see `ModelConfig::sphere_radius`).

use tracing::{debug, warn};

use crate::error::{parse_finite, ModelError, ModelResult};

/// One buried sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rho: f64,
}

impl Source {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64, rho: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            rho,
        }
    }
}

/// Raw, unparsed source fields as typed into a form or passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct SourceInput {
    pub name: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub rho: String,
}

impl SourceInput {
    pub fn new(name: &str, x: &str, y: &str, z: &str, rho: &str) -> Self {
        Self {
            name: name.to_string(),
            x: x.to_string(),
            y: y.to_string(),
            z: z.to_string(),
            rho: rho.to_string(),
        }
    }

    /// Parse `NAME:X:Y:Z:RHO` (NAME may be empty).
    pub fn from_colon_spec(spec: &str) -> ModelResult<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() != 5 {
            return Err(ModelError::validation("source (NAME:X:Y:Z:RHO)", spec));
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3], parts[4]))
    }

    /// Parse every numeric field. A blank name is replaced by `fallback_name`.
    pub fn parse(&self, fallback_name: &str) -> ModelResult<Source> {
        let x = parse_finite("x", &self.x)?;
        let y = parse_finite("y", &self.y)?;
        let z = parse_finite("z", &self.z)?;
        let rho = parse_finite("rho", &self.rho)?;

        let name = self.name.trim();
        let name = if name.is_empty() { fallback_name } else { name };
        Ok(Source::new(name, x, y, z, rho))
    }
}

/// Ordered collection of sources. Positions compact on delete.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

/// Name assigned to a source with a blank name at 0-based `index`.
pub fn default_name(index: usize) -> String {
    format!("p{}", index + 1)
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn list(&self) -> &[Source] {
        &self.sources
    }

    pub fn get(&self, index: usize) -> ModelResult<&Source> {
        self.sources.get(index).ok_or(ModelError::IndexOutOfRange {
            index,
            len: self.sources.len(),
        })
    }

    /// Append a parsed source. A blank name becomes `p{len+1}`.
    pub fn add(&mut self, mut source: Source) -> usize {
        if source.name.trim().is_empty() {
            source.name = default_name(self.sources.len());
        }
        warn_if_shallow(&source);
        debug!(name = %source.name, x = source.x, y = source.y, z = source.z, rho = source.rho, "source added");
        self.sources.push(source);
        self.sources.len() - 1
    }

    /// Replace the source at `index`. A blank name becomes `p{index+1}`.
    pub fn update(&mut self, index: usize, mut source: Source) -> ModelResult<()> {
        let len = self.sources.len();
        let slot = self
            .sources
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfRange { index, len })?;
        if source.name.trim().is_empty() {
            source.name = default_name(index);
        }
        warn_if_shallow(&source);
        debug!(index, name = %source.name, "source updated");
        *slot = source;
        Ok(())
    }

    /// Remove and return the source at `index`; later sources shift down by one.
    pub fn delete(&mut self, index: usize) -> ModelResult<Source> {
        if index >= self.sources.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.sources.len(),
            });
        }
        let removed = self.sources.remove(index);
        debug!(index, name = %removed.name, "source deleted");
        Ok(removed)
    }

    /// Parse raw input and append. On a parse error nothing changes.
    pub fn add_input(&mut self, input: &SourceInput) -> ModelResult<usize> {
        let source = input.parse(&default_name(self.sources.len()))?;
        Ok(self.add(source))
    }

    /// Parse raw input and replace at `index`. On any error nothing changes.
    pub fn update_input(&mut self, index: usize, input: &SourceInput) -> ModelResult<()> {
        if index >= self.sources.len() {
            return Err(ModelError::IndexOutOfRange {
                index,
                len: self.sources.len(),
            });
        }
        let source = input.parse(&default_name(index))?;
        self.update(index, source)
    }
}

fn warn_if_shallow(s: &Source) {
    if s.z <= 0.0 {
        warn!(name = %s.name, z = s.z, "source depth is not positive; anomaly sign/singularity guard will apply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, x: &str) -> SourceInput {
        SourceInput::new(name, x, "0", "50", "300")
    }

    #[test]
    fn blank_names_follow_position_at_insert_time() {
        let mut reg = SourceRegistry::new();
        reg.add_input(&input("", "1")).unwrap();
        reg.add_input(&input("  ", "2")).unwrap();
        reg.add_input(&input("dome", "3")).unwrap();
        let names: Vec<&str> = reg.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["p1", "p2", "dome"]);
    }

    #[test]
    fn update_uses_index_for_blank_name() {
        let mut reg = SourceRegistry::new();
        reg.add(Source::new("a", 0.0, 0.0, 10.0, 1.0));
        reg.add(Source::new("b", 0.0, 0.0, 10.0, 1.0));
        reg.update_input(1, &input("", "7.5")).unwrap();
        let s = reg.get(1).unwrap();
        assert_eq!(s.name, "p2");
        assert_eq!(s.x, 7.5);
    }

    #[test]
    fn bad_numbers_leave_registry_unchanged() {
        let mut reg = SourceRegistry::new();
        reg.add(Source::new("a", 1.0, 2.0, 3.0, 4.0));
        let before = reg.list().to_vec();

        let bad = SourceInput::new("x", "1", "two", "3", "4");
        assert!(matches!(reg.add_input(&bad), Err(ModelError::Validation { .. })));
        assert!(matches!(reg.update_input(0, &bad), Err(ModelError::Validation { .. })));
        assert_eq!(reg.list(), before.as_slice());
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut reg = SourceRegistry::new();
        reg.add(Source::new("a", 0.0, 0.0, 1.0, 1.0));
        assert!(matches!(
            reg.delete(3),
            Err(ModelError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            reg.update(1, Source::new("b", 0.0, 0.0, 1.0, 1.0)),
            Err(ModelError::IndexOutOfRange { .. })
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn delete_compacts_positions() {
        let mut reg = SourceRegistry::new();
        for n in ["a", "b", "c", "d"] {
            reg.add(Source::new(n, 0.0, 0.0, 1.0, 1.0));
        }
        let removed = reg.delete(1).unwrap();
        assert_eq!(removed.name, "b");
        assert_eq!(reg.get(1).unwrap().name, "c");
        assert_eq!(reg.get(2).unwrap().name, "d");
        assert!(reg.get(3).is_err());
    }

    #[test]
    fn colon_spec_parses_and_rejects_wrong_arity() {
        let s = SourceInput::from_colon_spec(":10:-20:150:-250")
            .unwrap()
            .parse("p1")
            .unwrap();
        assert_eq!(s, Source::new("p1", 10.0, -20.0, 150.0, -250.0));
        assert!(SourceInput::from_colon_spec("a:1:2:3").is_err());
    }
}
