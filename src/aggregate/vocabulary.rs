//! Classification and extraction vocabulary

use serde::Deserialize;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const WON_NS: &str = "http://purl.org/webofneeds/model#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const GEO_NS: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#";

/// Predicate and class IRIs the aggregator reacts to
///
/// Every entry can be overridden in the `[vocabulary]` table of the
/// configuration file; missing entries fall back to the Web-of-Needs defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    #[serde(rename = "type-predicate")]
    pub type_predicate: String,

    /// Class a document must be typed with to be indexed
    #[serde(rename = "need-class")]
    pub need_class: String,

    pub title: String,
    pub description: String,
    pub category: String,
    pub tag: String,

    #[serde(rename = "price-lower")]
    pub price_lower: String,

    #[serde(rename = "price-upper")]
    pub price_upper: String,

    pub latitude: String,
    pub longitude: String,

    /// Relation whose subject identifies the document
    #[serde(rename = "has-connections")]
    pub has_connections: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            type_predicate: RDF_TYPE.to_string(),
            need_class: format!("{}Need", WON_NS),
            title: format!("{}title", DC_NS),
            description: format!("{}textDescription", WON_NS),
            category: format!("{}hasBasicNeedType", WON_NS),
            tag: format!("{}hasTag", WON_NS),
            price_lower: format!("{}hasLowerPriceLimit", WON_NS),
            price_upper: format!("{}hasUpperPriceLimit", WON_NS),
            latitude: format!("{}latitude", GEO_NS),
            longitude: format!("{}longitude", GEO_NS),
            has_connections: format!("{}hasConnections", WON_NS),
        }
    }
}

impl Vocabulary {
    /// Iterates (configuration key, IRI) for every entry
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("type-predicate", self.type_predicate.as_str()),
            ("need-class", self.need_class.as_str()),
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("category", self.category.as_str()),
            ("tag", self.tag.as_str()),
            ("price-lower", self.price_lower.as_str()),
            ("price-upper", self.price_upper.as_str()),
            ("latitude", self.latitude.as_str()),
            ("longitude", self.longitude.as_str()),
            ("has-connections", self.has_connections.as_str()),
        ]
        .into_iter()
    }
}
