//! Merge the request's parameter sources into one bag.

use serde_json::{Map, Value};

use crate::context::params::{jar_to_value, Param, ParamBag, UploadedFile, COOKIE_KEY};
use crate::cookie::{parse_pairs, CookieJar};

/// Build the parameter bag for one request.
///
/// Layers are applied in order, each overwriting same-named keys:
/// `{cookie: jar}`, query, body, files. A string `cookie` field in the query
/// or the body is parsed into a mapping before its layer is applied.
pub fn build(
    mut query: Map<String, Value>,
    mut body: Map<String, Value>,
    files: Vec<(String, UploadedFile)>,
    jar: CookieJar,
) -> ParamBag {
    expand_cookie_field(&mut query);
    expand_cookie_field(&mut body);

    let mut bag = ParamBag::new();
    bag.insert_value(COOKIE_KEY, jar_to_value(&jar));
    bag.extend_values(query);
    bag.extend_values(body);
    for (field, file) in files {
        bag.insert(field, Param::File(file));
    }

    bag
}

fn expand_cookie_field(fields: &mut Map<String, Value>) {
    if let Some(Value::String(raw)) = fields.get(COOKIE_KEY) {
        let jar = parse_pairs(raw);
        fields.insert(COOKIE_KEY.to_string(), jar_to_value(&jar));
    }
}
