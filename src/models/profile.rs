use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Declares an enum parsed from internal profile codes. Unknown codes, and
/// values that are not strings at all, map to the `#[default]` variant
/// instead of failing.
macro_rules! profile_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => [$($code:literal),+] => $phrase:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
        #[serde(into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Vocabulary used in generation prompts.
            pub fn phrase(&self) -> &'static str {
                match self {
                    $( $name::$variant => $phrase ),+
                }
            }

            /// Canonical internal code.
            pub fn code(&self) -> &'static str {
                match self {
                    $( $name::$variant => [$($code),+][0] ),+
                }
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                let code = code.trim().to_ascii_lowercase();
                match code.as_str() {
                    $( $($code)|+ => $name::$variant, )+
                    _ => $name::default(),
                }
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                $name::from(code.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = serde_json::Value::deserialize(deserializer)?;
                Ok(value.as_str().map(|code| $name::from(code)).unwrap_or_default())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.code().to_string()
            }
        }
    };
}

profile_enum! {
    Gender {
        #[default]
        Female => ["woman", "female", "women"] => "female",
        Male => ["man", "male", "men"] => "male",
    }
}

profile_enum! {
    Ethnicity {
        Caucasian => ["caucasian", "white", "european"] => "Caucasian",
        African => ["african", "black"] => "African",
        EastAsian => ["east-asian", "asian"] => "East Asian",
        SouthAsian => ["south-asian", "indian"] => "South Asian",
        Hispanic => ["hispanic", "latino", "latina"] => "Hispanic",
        MiddleEastern => ["middle-eastern", "arab"] => "Middle Eastern",
        #[default]
        Mixed => ["mixed"] => "ethnically ambiguous",
    }
}

profile_enum! {
    BodyType {
        Slim => ["slim", "thin"] => "slim",
        Athletic => ["athletic", "fit"] => "athletic",
        #[default]
        Average => ["average", "regular"] => "average build",
        Curvy => ["curvy"] => "curvy",
        PlusSize => ["plus-size", "plus"] => "plus-size",
    }
}

profile_enum! {
    AgeRange {
        Young => ["18-25"] => "in their early twenties",
        #[default]
        Adult => ["26-35"] => "in their late twenties to early thirties",
        Mature => ["36-45"] => "in their late thirties to early forties",
        Senior => ["46-60"] => "in their fifties",
    }
}

profile_enum! {
    Orientation {
        #[default]
        Vertical => ["vertical", "portrait"] => "vertical 3:4 portrait",
        Horizontal => ["horizontal", "landscape"] => "horizontal 4:3 landscape",
    }
}

/// Field deserializer that substitutes `T::default()` for null or malformed values.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Model characteristics requested by the merchant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectProfile {
    pub gender: Gender,
    pub ethnicity: Ethnicity,
    pub body_type: BodyType,
    pub age_range: AgeRange,
}

impl SubjectProfile {
    pub fn describe(&self) -> String {
        format!(
            "a {} model of {} appearance, {}, {}",
            self.gender.phrase(),
            self.ethnicity.phrase(),
            self.body_type.phrase(),
            self.age_range.phrase()
        )
    }
}
