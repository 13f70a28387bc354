//! Script wrapper recognition and rendering.

use crate::fragment::{Fragment, FragmentError, FragmentResult};
use crate::model::{Channel, Implementor, LibraryMap, TypeImpl};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\(function\(\)\s*\{\s*var\s+(?P<var>[A-Za-z_]+)\s*=\s*")
        .expect("valid fragment header regex")
});
static TRAILER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r";\s*if\s*\(\s*window\.(?P<check>[A-Za-z_]+)\s*\)\s*\{\s*",
        r"window\.(?P<call>[A-Za-z_]+)\(\s*(?P<arg>[A-Za-z_]+)\s*\)\s*;?\s*\}\s*",
        r"else\s*\{\s*window\.(?P<pending>[A-Za-z_]+)\s*=\s*(?P<assigned>[A-Za-z_]+)\s*;?\s*\}\s*",
        r"\}\)\(\)\s*;?\s*(?://[^\n]*\s*)?$"
    ))
    .expect("valid fragment trailer regex")
});

const FROM_ENTRIES_PREFIX: &str = "Object.fromEntries(";

/// Parses one fragment script into its channel payload.
///
/// Accepts an object-literal payload or `Object.fromEntries([...])`.
pub fn parse_fragment(script: &str) -> FragmentResult<Fragment> {
    let header = HEADER_RE
        .captures(script)
        .ok_or(FragmentError::UnrecognizedScript("function header"))?;
    let var = header.name("var").map_or("", |m| m.as_str());
    let channel = Channel::from_var_name(var)
        .ok_or_else(|| FragmentError::UnknownChannel(var.to_string()))?;
    let payload_start = header.get(0).map_or(0, |m| m.end());

    let trailer = TRAILER_RE
        .captures(&script[payload_start..])
        .ok_or(FragmentError::UnrecognizedScript("registration trailer"))?;
    for (name, expected) in [
        ("check", channel.register_fn()),
        ("call", channel.register_fn()),
        ("arg", channel.as_str()),
        ("pending", channel.pending_global()),
        ("assigned", channel.as_str()),
    ] {
        let found = trailer.name(name).map_or("", |m| m.as_str());
        if found != expected {
            return Err(FragmentError::ChannelMismatch {
                channel,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
    }
    let payload_end = payload_start + trailer.get(0).map_or(0, |m| m.start());
    let payload = script[payload_start..payload_end].trim();

    match channel {
        Channel::Implementors => {
            let raw: BTreeMap<String, Vec<Implementor>> = decode_payload(payload)?;
            Ok(Fragment::Implementors(raw.into_iter().collect()))
        }
        Channel::TypeImpls => {
            let raw: BTreeMap<String, Vec<TypeImpl>> = decode_payload(payload)?;
            Ok(Fragment::TypeImpls(raw.into_iter().collect()))
        }
    }
}

// Later duplicate keys win, as with a JS object.
fn decode_payload<T: DeserializeOwned>(payload: &str) -> FragmentResult<BTreeMap<String, T>> {
    if let Some(inner) = payload
        .strip_prefix(FROM_ENTRIES_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let pairs: Vec<(String, T)> = serde_json::from_str(inner)?;
        return Ok(pairs.into_iter().collect());
    }
    Ok(serde_json::from_str(payload)?)
}

/// Renders a fragment as an object-literal self-registering script.
pub fn render_fragment(fragment: &Fragment) -> FragmentResult<String> {
    let (channel, payload) = match fragment {
        Fragment::Implementors(map) => (Channel::Implementors, render_payload(map)?),
        Fragment::TypeImpls(map) => (Channel::TypeImpls, render_payload(map)?),
    };
    let var = channel.as_str();
    let register = channel.register_fn();
    Ok(format!(
        "(function() {{var {var} = {payload};if (window.{register}) {{window.{register}({var});}} else {{window.{pending} = {var};}}}})()",
        pending = channel.pending_global()
    ))
}

fn render_payload<E: serde::Serialize>(map: &LibraryMap<E>) -> FragmentResult<String> {
    // One library per line, matching generated output.
    let mut lines = Vec::with_capacity(map.len());
    for (library, entries) in map.iter() {
        lines.push(format!(
            "{}:{}",
            serde_json::to_string(library)?,
            serde_json::to_string(entries)?
        ));
    }
    Ok(format!("{{\n{}\n}}", lines.join(",\n")))
}

#[cfg(test)]
mod tests {
    use super::parse_fragment;
    use crate::fragment::{Fragment, FragmentError};
    use crate::model::{Channel, Implementor, ImplementorMap, TypeImpl, TypeImplMap};
    use serde_json::json;

    const COPY_FRAGMENT: &str = concat!(
        "(function() {var implementors = {\n",
        r#""lurk":[["impl <a class=\"trait\" href=\"core/marker/trait.Copy.html\">Copy</a> for <a class=\"enum\">RawPtr</a>"],"#,
        r#"["impl Copy for Pos"]]"#,
        "\n};if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()"
    );

    const TYPE_IMPL_FRAGMENT: &str = concat!(
        "(function() {var type_impls = {\n",
        r#""lurk":[["<section id=\"impl-Copy-for-Stub%3CT%3E\" class=\"impl\"></section>","Copy","lurk::hash_witness::ConsStub","lurk::hash_witness::ContStub"]]"#,
        "\n};if (window.register_type_impls) {window.register_type_impls(type_impls);} else {window.pending_type_impls = type_impls;}})()"
    );

    #[test]
    fn parses_object_literal_implementors() {
        let fragment = parse_fragment(COPY_FRAGMENT).expect("fragment should parse");
        assert_eq!(fragment.channel(), Channel::Implementors);
        let Fragment::Implementors(map) = fragment else {
            panic!("expected implementors fragment");
        };
        let entries = map.get("lurk").expect("lurk entries");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].text().contains("RawPtr"));
        assert_eq!(entries[1].text(), "impl Copy for Pos");
    }

    #[test]
    fn parses_type_impls_with_aliases() {
        let fragment = parse_fragment(TYPE_IMPL_FRAGMENT).expect("fragment should parse");
        let Fragment::TypeImpls(map) = fragment else {
            panic!("expected type impls fragment");
        };
        let entry = &map.get("lurk").expect("lurk entries")[0];
        assert_eq!(entry.trait_name.as_deref(), Some("Copy"));
        assert_eq!(
            entry.aliases,
            ["lurk::hash_witness::ConsStub", "lurk::hash_witness::ContStub"]
        );
    }

    #[test]
    fn parses_from_entries_payload_with_trailing_comment() {
        let script = concat!(
            "(function() {\n    var implementors = Object.fromEntries([[\"lib1\",[[\"X\"]]],[\"lib2\",[[\"Y\",1,[\"lib2::Y\"]]]]]);\n",
            "    if (window.register_implementors) {\n        window.register_implementors(implementors);\n",
            "    } else {\n        window.pending_implementors = implementors;\n    }\n})()\n",
            "//{\"start\":57,\"fragment_lengths\":[12,14]}\n"
        );
        let fragment = parse_fragment(script).expect("fromEntries fragment should parse");
        let expected = ImplementorMap::new()
            .with_library("lib1", vec![Implementor::new("X")])
            .with_library(
                "lib2",
                vec![Implementor::with_types("Y", true, vec!["lib2::Y".to_string()])],
            );
        assert_eq!(fragment, Fragment::Implementors(expected));

        let Fragment::Implementors(map) = &fragment else {
            panic!("expected implementors fragment");
        };
        let entry = &map.get("lib2").expect("lib2 entries")[0];
        assert_eq!(entry.raw(), &json!(["Y", 1, ["lib2::Y"]]));
        let rendered = fragment.to_script().expect("render");
        assert!(rendered.contains(r#""lib2":[["Y",1,["lib2::Y"]]]"#));
        assert_eq!(parse_fragment(&rendered).expect("parse rendered"), fragment);
    }

    #[test]
    fn object_literal_scripts_render_back_unchanged() {
        for script in [COPY_FRAGMENT, TYPE_IMPL_FRAGMENT] {
            let fragment = parse_fragment(script).expect("fragment should parse");
            assert_eq!(fragment.to_script().expect("render"), script);
        }
    }

    #[test]
    fn rejects_mismatched_pending_global() {
        let script = COPY_FRAGMENT.replace("window.pending_implementors", "window.pending_type_impls");
        let err = parse_fragment(&script).expect_err("mismatch must fail");
        assert!(matches!(
            err,
            FragmentError::ChannelMismatch { ref found, .. } if found == "pending_type_impls"
        ));
    }

    #[test]
    fn rejects_unknown_channel_and_foreign_scripts() {
        let search = COPY_FRAGMENT.replacen("var implementors", "var search_index", 1);
        assert!(matches!(
            parse_fragment(&search),
            Err(FragmentError::UnknownChannel(ref name)) if name == "search_index"
        ));
        assert!(matches!(
            parse_fragment("console.log('hi')"),
            Err(FragmentError::UnrecognizedScript(_))
        ));
    }

    #[test]
    fn rejects_malformed_entries() {
        let script = COPY_FRAGMENT.replace(r#"["impl Copy for Pos"]"#, "[]");
        let err = parse_fragment(&script).expect_err("empty entry must fail");
        assert!(matches!(err, FragmentError::InvalidPayload(_)));
        assert!(err.to_string().contains("implementor entry must be"));

        let broken = COPY_FRAGMENT.replace("\"lurk\":", "lurk:");
        assert!(matches!(
            parse_fragment(&broken),
            Err(FragmentError::InvalidPayload(_))
        ));
    }

    #[test]
    fn rendered_scripts_are_recognized() {
        let map = TypeImplMap::new().with_library(
            "arecibo",
            vec![TypeImpl::new("<h3>impl Clone</h3>", "Clone").with_alias("lurk::proof::SS1")],
        );
        let fragment = Fragment::TypeImpls(map);
        let script = fragment.to_script().expect("render");
        assert!(script.contains("window.pending_type_impls = type_impls;"));
        assert_eq!(parse_fragment(&script).expect("parse rendered"), fragment);
    }
}
