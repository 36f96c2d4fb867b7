//! Property tests over generated element trees

use proptest::prelude::*;

use xfa2data::converters::{CsvEmitter, Emitter, JsonEmitter, Normalizer, XmlEmitter};
use xfa2data::documents::{AttributeMap, Document, Element};
use xfa2data::ConverterConfig;

fn tag() -> impl Strategy<Value = String> {
    "f[a-z]{0,2}"
}

fn attributes() -> impl Strategy<Value = AttributeMap> {
    prop::collection::vec(("[a-z]{1,4}", "[a-z0-9]{0,6}"), 0..3)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z0-9]{1,8}")
}

fn element() -> impl Strategy<Value = Element> {
    let leaf = (tag(), attributes(), text()).prop_map(|(tag, attributes, text)| Element {
        tag,
        attributes,
        text,
        children: Vec::new(),
    });

    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            tag(),
            attributes(),
            text(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, attributes, text, children)| Element {
                tag,
                attributes,
                text,
                children,
            })
    })
}

proptest! {
    #[test]
    fn normalization_is_deterministic(root in element()) {
        let config = ConverterConfig::default();
        let normalizer = Normalizer::new(&config);

        let first = normalizer.normalize_document(&root);
        let second = normalizer.normalize_document(&root.clone());
        prop_assert_eq!(&first, &second);

        let emitter = JsonEmitter::with_config(config.clone());
        prop_assert_eq!(emitter.emit(&first).unwrap(), emitter.emit(&second).unwrap());
    }

    #[test]
    fn xml_output_reparses_to_same_value(root in element()) {
        let config = ConverterConfig::default();
        let normalizer = Normalizer::new(&config);
        let value = normalizer.normalize_document(&root);

        let xml = XmlEmitter::with_config(config.clone()).emit(&value).unwrap();
        let reparsed = Document::from_string(&xml).unwrap();

        prop_assert_eq!(normalizer.normalize_document(reparsed.root()), value);
    }

    #[test]
    fn csv_always_has_a_row(root in element()) {
        let config = ConverterConfig::default();
        let value = Normalizer::new(&config).normalize_document(&root);

        let rows = CsvEmitter::with_config(config).rows(&value);
        prop_assert!(!rows.is_empty());
    }
}
