//! YAML-readable types

use std::convert::TryFrom;
use yaml_rust::yaml::Yaml;
use evalexpr::HashMapContext;

use crate::geometry::Spheroid;

/// Types that can be parsed from a YML-formatted file
pub trait FromYaml: Sized {
    type Error;
    /// Attempt to parse the YML field as the specified type, using the supplied Context for named variables and constants.
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error>;
}

// Atomic

impl FromYaml for bool {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Boolean(b) => Ok(b),
            Yaml::String(s) => match s.as_str() {
                "y" | "yes" | "on" => Ok(true),
                "n" | "no" | "off" => Ok(false),
                _ => Err(()),
            },
            _ => Err(())
        }
    }
}

/// Scalars are returned exactly as written, so that decimals can be
/// re-parsed at a precision higher than `f64`.
impl FromYaml for String {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::String(s) => Ok(s),
            Yaml::Integer(i) => Ok(i.to_string()),
            Yaml::Real(s) => Ok(s),
            Yaml::Boolean(b) => Ok(b.to_string()),
            _ => Err(())
        }
    }
}

impl FromYaml for Spheroid {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let name: String = FromYaml::from_yaml(arg, ctx)?;
        Spheroid::from_name(&name).ok_or(())
    }
}

// Integers: i64, usize, u32

impl FromYaml for i64 {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Integer(i) => Ok(i),
            _ => Err(())
        }
    }
}

impl FromYaml for usize {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let i: i64 = FromYaml::from_yaml(arg, ctx)?;
        usize::try_from(i).map_err(|_| ())
    }
}

impl FromYaml for u32 {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let i: i64 = FromYaml::from_yaml(arg, ctx)?;
        u32::try_from(i).map_err(|_| ())
    }
}

// Vecs

impl FromYaml for Vec<String> {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let take_yaml_string = |y: &Yaml| -> Option<String> {
            match y {
                Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
                Yaml::Integer(i) => Some(i.to_string()),
                Yaml::Boolean(b) => Some(b.to_string()),
                _ => None
            }
        };

        match arg {
            Yaml::Array(array) => {
                let got: Vec<String> = array.iter().filter_map(take_yaml_string).collect();
                if got.is_empty() {
                    Err(())
                } else {
                    Ok(got)
                }
            },
            // turn a single String into a vec of length 1.
            other => take_yaml_string(&other).map(|s| vec![s]).ok_or(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_and_flags() {
        let ctx = HashMapContext::new();
        let shape = Spheroid::from_yaml(Yaml::String("obl".to_owned()), &ctx);
        assert_eq!(shape, Ok(Spheroid::from(crate::geometry::Oblate)));
        assert!(Spheroid::from_yaml(Yaml::String("sphere".to_owned()), &ctx).is_err());

        assert_eq!(bool::from_yaml(Yaml::String("y".to_owned()), &ctx), Ok(true));
        assert_eq!(u32::from_yaml(Yaml::Integer(-1), &ctx), Err(()));
    }
}
