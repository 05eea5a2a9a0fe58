// tagsieve-core/tests/policy_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;
use test_log::test;

use tagsieve_core::{headless_scan, DiagnosticKind, OnInvalid, Policy, SieveError, TagAction};

const FORUM_POLICY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<anti-samy-rules>
  <directives>
    <directive name="maxInputSize" value="500"/>
    <directive name="preserveComments" value="false"/>
  </directives>
  <common-regexps>
    <regexp name="word" value="[a-z]+"/>
  </common-regexps>
  <common-attributes>
    <attribute name="class">
      <regexp-list>
        <regexp name="word"/>
      </regexp-list>
    </attribute>
  </common-attributes>
  <global-tag-attributes>
    <attribute name="class" onInvalid="removeTag"/>
  </global-tag-attributes>
  <tag-rules>
    <tag name="p" action="validate"/>
    <tag name="em" action="validate"/>
    <tag name="marquee" action="remove"/>
  </tag-rules>
  <css-rules/>
</anti-samy-rules>
"#;

fn write_policy(xml: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(xml.as_bytes())?;
    Ok(file)
}

#[test]
fn test_policy_from_file_drives_the_scan() -> Result<()> {
    let file = write_policy(FORUM_POLICY)?;
    let policy = Policy::from_file(file.path())?;

    assert_eq!(policy.tag_rule("marquee").map(|t| t.action), Some(TagAction::Remove));
    assert_eq!(
        policy.global_attribute("class").map(|a| a.on_invalid),
        Some(OnInvalid::RemoveTag)
    );

    let result = headless_scan(
        r#"<p class="intro">hi<!-- x --><em class="NOPE">gone</em><marquee>m</marquee></p>"#,
        &policy,
    )?;
    assert_eq!(result.clean_output(), r#"<p class="intro">hi</p>"#);
    assert_eq!(result.count_of(DiagnosticKind::AttributeInvalid), 1);
    assert_eq!(result.count_of(DiagnosticKind::TagRemoved), 1);
    Ok(())
}

#[test]
fn test_file_policy_size_limit() -> Result<()> {
    let file = write_policy(FORUM_POLICY)?;
    let policy = Policy::from_file(file.path())?;
    let err = headless_scan(&"x".repeat(501), &policy).unwrap_err();
    assert!(matches!(err, SieveError::InputTooLarge { size: 501, max: 500 }));
    Ok(())
}

#[test]
fn test_missing_policy_file() {
    let err = Policy::from_file("/definitely/not/here/policy.xml").unwrap_err();
    assert!(matches!(err, SieveError::PolicyIo { .. }));
    assert!(err.is_config_error());
}

#[test]
fn test_invalid_directive_falls_back_to_default() -> Result<()> {
    let xml = r#"<policy>
        <directives><directive name="maxInputSize" value="lots"/></directives>
        <tag-rules><tag name="b" action="validate"/></tag-rules>
    </policy>"#;
    let policy = Policy::from_xml_str(xml)?;
    assert!(matches!(
        policy.directive_as_int("maxInputSize", 1),
        Err(SieveError::InvalidDirective { .. })
    ));
    let result = headless_scan("<b>fine</b>", &policy)?;
    assert_eq!(result.clean_output(), "<b>fine</b>");
    Ok(())
}

#[test]
fn test_policy_is_shared_read_only_across_scans() -> Result<()> {
    let policy = Policy::load_default()?;
    let first = headless_scan("<u onmouseover=\"x\">a</u>", &policy)?;
    let second = headless_scan("<u onmouseover=\"x\">a</u>", &policy)?;
    assert_eq!(first.clean_output(), second.clean_output());
    assert_eq!(first.error_messages(), second.error_messages());
    Ok(())
}
