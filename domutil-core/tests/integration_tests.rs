/// Integration tests for domutil-core
///
/// These tests verify:
/// 1. Conversion of HTML4, HTML5 and XML in several encodings, with and
///    without transcoding and repair
/// 2. Query helpers against converted documents
/// 3. Converter configuration

use domutil_core::{
    dom_util, CharsetConverter, ConverterConfig, DocumentKind, DomConverter, DomError, TidyWrapper,
};
use pretty_assertions::assert_eq;

const QUERY: &str = "//div[@id='foo']//input/@value";
const EXPECTED: &str = "äöü";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flavor {
    Html4,
    Html5,
    Xml,
}

impl Flavor {
    fn kind(self) -> DocumentKind {
        match self {
            Flavor::Html4 | Flavor::Html5 => DocumentKind::Html,
            Flavor::Xml => DocumentKind::Xml,
        }
    }
}

/// Build a test document, encoded in `encoding` (UTF-8 when `None`)
fn response_bytes(flavor: Flavor, encoding: Option<&str>, malformed: bool) -> Vec<u8> {
    let malformed_markup = if malformed {
        "<p class='unclosed'>malformed<span>"
    } else {
        ""
    };
    let body = concat!(
        "Just a little piece of text with some german umlauts like äöüßÄÖÜ and maybe some more UTF-8 characters",
        r#"<div id="foo"><input type="hidden" value="äöü" /></div>"#
    );

    let markup = match flavor {
        Flavor::Html4 => {
            let meta = encoding
                .map(|e| format!("<meta http-equiv='content-type' content='text/html; charset={}' />", e))
                .unwrap_or_default();
            format!(
                "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\" \"http://www.w3.org/TR/html4/loose.dtd\">\
                 <html><head>{meta}<title>Umlauts everywhere öäüßÖÄÜ</title>{malformed_markup}</head><body>{body}</body></html>"
            )
        }
        Flavor::Html5 => {
            let meta = encoding
                .map(|e| format!("<meta charset='{}' />", e))
                .unwrap_or_default();
            format!(
                "<!DOCTYPE html><html><head>{meta}<title>Umlauts everywhere öäüßÖÄÜ</title>{malformed_markup}</head><body>{body}</body></html>"
            )
        }
        Flavor::Xml => {
            let declaration = encoding
                .map(|e| format!(" encoding='{}'", e))
                .unwrap_or_default();
            format!("<?xml version='1.0'{declaration}?>{malformed_markup}<foo><bar></bar>{body}</foo>")
        }
    };

    match encoding {
        Some(label) => {
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes()).unwrap();
            let (bytes, _, had_errors) = encoding.encode(&markup);
            assert!(!had_errors, "test markup must be representable in {}", label);
            bytes.into_owned()
        }
        None => markup.into_bytes(),
    }
}

fn converter(flavor: Flavor, transcode: bool, repair: bool) -> DomConverter {
    let mut converter = DomConverter::new(flavor.kind());
    if transcode {
        converter = converter.with_encoding_converter(CharsetConverter::new());
    }
    if repair {
        converter = converter.with_repairer(TidyWrapper::default());
    }
    converter
}

fn query_value(converter: &DomConverter, input: &[u8]) -> Result<String, DomError> {
    let mut doc = converter.convert(input)?;
    let mut xpath = doc.xpath();
    dom_util::text_content(&mut xpath, QUERY, None)
}

#[test]
fn test_convert_matrix() {
    let flavors = [Flavor::Html4, Flavor::Html5, Flavor::Xml];
    let encodings = [Some("utf-8"), Some("iso-8859-1"), None];

    for flavor in flavors {
        for encoding in encodings {
            for malformed in [false, true] {
                let input = response_bytes(flavor, encoding, malformed);

                for transcode in [false, true] {
                    for repair in [false, true] {
                        let converter = converter(flavor, transcode, repair);
                        let result = query_value(&converter, &input);
                        let case = format!(
                            "{:?} encoding={:?} malformed={} transcode={} repair={}",
                            flavor, encoding, malformed, transcode, repair
                        );

                        if flavor == Flavor::Xml && malformed && !repair {
                            assert!(
                                matches!(
                                    result,
                                    Err(DomError::DocumentConversion { kind: DocumentKind::Xml, .. })
                                ),
                                "{}: expected conversion error, got {:?}",
                                case,
                                result
                            );
                        } else {
                            match result {
                                Ok(value) => assert_eq!(value, EXPECTED, "{}", case),
                                Err(e) => panic!("{}: {}", case, e),
                            }
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_transcoded_document_records_target_encoding() {
    let input = response_bytes(Flavor::Html5, Some("iso-8859-1"), false);
    let doc = converter(Flavor::Html5, true, false).convert(&input).unwrap();
    assert_eq!(doc.encoding(), Some("utf-8"));

    let doc = converter(Flavor::Html5, false, false).convert(&input).unwrap();
    assert_eq!(doc.encoding(), Some("windows-1252"));
}

#[test]
fn test_malformed_html_is_recovered_by_parser() {
    let input = response_bytes(Flavor::Html4, Some("utf-8"), true);
    let mut doc = converter(Flavor::Html4, false, false).convert(&input).unwrap();
    let mut xpath = doc.xpath();

    assert!(dom_util::element_exists(&mut xpath, "//p[@class='unclosed']/span", None).unwrap());
    assert_eq!(
        dom_util::text_content(&mut xpath, "//title", None).unwrap(),
        "Umlauts everywhere öäüßÖÄÜ"
    );
}

#[test]
fn test_query_helpers_on_html() {
    let html = r#"<html><body>
        <ul id="menu"><li class="item active">Home</li><li class="item">About</li></ul>
        </body></html>"#;
    let mut doc = DomConverter::new(DocumentKind::Html)
        .convert(html.as_bytes())
        .unwrap();
    let mut xpath = doc.xpath();

    let active = format!("//li[{}]", dom_util::contains_xpath_expression("@class", "active"));
    assert_eq!(dom_util::text_content(&mut xpath, &active, None).unwrap(), "Home");

    let items = format!("//li[{}]", dom_util::contains_xpath_expression("@class", "item"));
    assert_eq!(xpath.query(&items, None).unwrap().len(), 2);

    assert_eq!(
        dom_util::outer_html(&mut xpath, "//li[2]", None).unwrap(),
        r#"<li class="item">About</li>"#
    );

    let menu = xpath.query("//ul", None).unwrap().first();
    assert_eq!(
        dom_util::inner_html(&mut xpath, "li[1]", menu).unwrap(),
        "Home"
    );

    let err = dom_util::inner_html(&mut xpath, "//table", None).unwrap_err();
    assert!(matches!(err, DomError::ElementNotFound { ref query } if query == "//table"));
}

#[test]
fn test_html_has_only_xml_namespace() {
    let doc = DomConverter::new(DocumentKind::Html)
        .convert(b"<html><body><p>x</p></body></html>")
        .unwrap();
    assert_eq!(
        dom_util::all_namespaces(&doc).unwrap(),
        vec![dom_util::XML_NAMESPACE]
    );
}

#[test]
fn test_whole_document_markup() {
    let doc = DomConverter::new(DocumentKind::Xml)
        .convert(b"<?xml version='1.0'?><root><a>1</a></root>")
        .unwrap();
    assert_eq!(doc.to_xml_string().unwrap(), "<root><a>1</a></root>");
}

#[test]
fn test_config_with_unknown_kind() {
    let config = ConverterConfig {
        kind: "yaml".to_string(),
        ..ConverterConfig::default()
    };
    let err = DomConverter::from_config(&config).unwrap_err();
    match err {
        DomError::InvalidConfiguration { value, allowed } => {
            assert_eq!(value, "yaml");
            assert_eq!(allowed, "HTML, XML");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_config_with_unknown_internal_encoding() {
    let config = ConverterConfig {
        repair: true,
        internal_encoding: "koi8-r".to_string(),
        ..ConverterConfig::default()
    };
    let converter = DomConverter::from_config(&config).unwrap();
    let err = converter.convert(b"<p>x</p>").unwrap_err();
    assert!(matches!(err, DomError::UnknownEncoding { .. }));
}

#[test]
fn test_xml_with_doctype() {
    let xhtml = concat!(
        "<?xml version='1.0' encoding='utf-8'?>\n",
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" ",
        "\"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n",
        "<html><body><div id='foo'><input value='äöü'/></div></body></html>"
    );

    for repair in [false, true] {
        let converter = converter(Flavor::Xml, false, repair);
        let value = query_value(&converter, xhtml.as_bytes())
            .unwrap_or_else(|e| panic!("repair={}: {}", repair, e));
        assert_eq!(value, EXPECTED, "repair={}", repair);
    }
}

#[test]
fn test_repair_keeps_root_namespaces() {
    let input = br#"<feed xmlns:media="urn:media" xmlns:dc="urn:dc"><entry><media:title>x</media:title></entry></feed>"#;

    let plain = converter(Flavor::Xml, false, false).convert(input).unwrap();
    let repaired = converter(Flavor::Xml, false, true).convert(input).unwrap();
    let expected = vec![dom_util::XML_NAMESPACE, "urn:dc", "urn:media"];
    assert_eq!(dom_util::all_namespaces(&plain).unwrap(), expected);
    assert_eq!(dom_util::all_namespaces(&repaired).unwrap(), expected);
}

#[test]
fn test_attribute_markup_keeps_prefix() {
    let mut doc = DomConverter::new(DocumentKind::Xml)
        .convert(br#"<root xmlns:x="urn:x" xml:lang="en" x:a="1"/>"#)
        .unwrap();
    let mut xpath = doc.xpath();

    assert_eq!(
        dom_util::outer_html(&mut xpath, "//@xml:lang", None).unwrap(),
        r#" xml:lang="en""#
    );
    assert_eq!(
        dom_util::outer_html(&mut xpath, "//@*[local-name() = 'a']", None).unwrap(),
        r#" x:a="1""#
    );
}

#[test]
fn test_atomic_values_as_strings() {
    let mut doc = DomConverter::new(DocumentKind::Html)
        .convert(b"<ul><li>1.5</li><li>2</li></ul>")
        .unwrap();
    let mut xpath = doc.xpath();

    assert_eq!(xpath.evaluate_strings("count(//li)", None).unwrap(), vec!["2"]);
    assert_eq!(xpath.evaluate_strings("sum(//li)", None).unwrap(), vec!["3.5"]);
    assert_eq!(xpath.evaluate_strings("//li = '2'", None).unwrap(), vec!["true"]);
}
