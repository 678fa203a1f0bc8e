/// An enumeration that travels as a fixed set of upper-case strings.
///
/// Implemented through `wire_enum!` so that the validation layer can check
/// membership and report the accepted values without knowing the concrete type.
pub trait WireEnum: Sized + Copy + 'static {
    /// Every accepted wire value, in declaration order.
    const VARIANTS: &'static [&'static str];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self>;
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $crate::model::WireEnum for $name {
            const VARIANTS: &'static [&'static str] = &[$($wire),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::model::WireEnum::as_str(self))
            }
        }
    };
}

/// Writes whole `f64` values without a fractional part, so a size of 52431 bytes
/// goes out as `52431` and not `52431.0`. Use with `serialize_with`.
pub mod whole_number {
    use serde::Serializer;

    /// Beyond 2^53 not every integer is representable, so those stay floats.
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract() == 0.0 && value.abs() <= EXACT_INTEGER_LIMIT {
            serializer.serialize_i64(*value as i64)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn serialize_option<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }
}

pub mod call;
pub mod document;
pub mod lead;

#[cfg(test)]
mod tests {
    use super::lead::LeadStatus;
    use super::WireEnum;

    #[test]
    fn wire_values_match_serde_names() {
        for wire in LeadStatus::VARIANTS {
            let parsed = LeadStatus::parse(wire).expect("declared variant parses");
            let json = serde_json::to_string(&parsed).unwrap();
            assert_eq!(json, format!("\"{wire}\""));
        }
        assert_eq!(LeadStatus::parse("new"), None);
    }

    #[derive(serde::Serialize)]
    struct Measured {
        #[serde(serialize_with = "super::whole_number::serialize")]
        size: f64,
        #[serde(serialize_with = "super::whole_number::serialize_option")]
        value: Option<f64>,
    }

    #[test]
    fn whole_numbers_drop_the_fraction() {
        let json = |size, value| serde_json::to_string(&Measured { size, value }).unwrap();
        assert_eq!(json(52431.0, Some(1500.0)), r#"{"size":52431,"value":1500}"#);
        assert_eq!(json(95.5, None), r#"{"size":95.5,"value":null}"#);
        assert_eq!(json(-0.0, Some(-12.0)), r#"{"size":0,"value":-12}"#);
        assert_eq!(json(1e300, None), r#"{"size":1e300,"value":null}"#);
    }
}
