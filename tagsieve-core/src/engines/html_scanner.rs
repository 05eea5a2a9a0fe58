// tagsieve-core/src/engines/html_scanner.rs
//! A `SanitizationEngine` that parses markup with html5ever, rewrites the
//! tree against a policy and serializes the result.
//! License: MIT OR APACHE 2.0

use chrono::Utc;
use html5ever::driver::ParseOpts;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{local_name, namespace_url, ns, parse_fragment, QualName};
use log::{debug, info};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::SanitizationEngine;
use crate::errors::SieveError;
use crate::policy::{Policy, DEFAULT_MAX_INPUT_SIZE, MAX_INPUT_SIZE};
use crate::preprocess;
use crate::rewriter::TreeRewriter;
use crate::scan_result::ScanResult;

/// Scans HTML fragments against a shared policy.
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    policy: Arc<Policy>,
}

impl HtmlScanner {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self { policy }
    }

    /// A scanner over the embedded default policy.
    pub fn with_default_policy() -> Result<Self, SieveError> {
        Ok(Self::new(Policy::shared_default()?))
    }
}

impl SanitizationEngine for HtmlScanner {
    fn scan(&self, markup: &str) -> Result<ScanResult, SieveError> {
        scan_with_policy(markup, &self.policy)
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }
}

/// The whole scan: normalize, size check, parse, rewrite, serialize.
pub(crate) fn scan_with_policy(markup: &str, policy: &Policy) -> Result<ScanResult, SieveError> {
    let started = Instant::now();
    let scanned_at = Utc::now();

    let prepared = preprocess::prepare(markup);
    let max = policy.int_directive_or_default(MAX_INPUT_SIZE, DEFAULT_MAX_INPUT_SIZE);
    let size = prepared.chars().count();
    if size > max {
        return Err(SieveError::InputTooLarge { size, max });
    }

    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        vec![],
    )
    .one(prepared);
    let root = fragment_root(&dom)?;

    let mut rewriter = TreeRewriter::new(policy);
    rewriter.rewrite(&root);
    let diagnostics = rewriter.into_diagnostics();

    let clean_output = serialize_children(&root)?;
    let elapsed = started.elapsed();
    info!(
        "Scanned {} characters in {:?} with {} diagnostic(s).",
        size,
        elapsed,
        diagnostics.len()
    );
    Ok(ScanResult::new(clean_output, diagnostics, elapsed, scanned_at))
}

/// The `<html>` element the fragment parser hangs the parsed nodes from.
fn fragment_root(dom: &RcDom) -> Result<Handle, SieveError> {
    let root = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned();
    root.ok_or_else(|| SieveError::MarkupParse("the parser produced no fragment root".to_string()))
}

fn serialize_children(root: &Handle) -> Result<String, SieveError> {
    let mut out = Vec::new();
    let handle: SerializableHandle = root.clone().into();
    serialize(
        &mut out,
        &handle,
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;
    debug!("Serialized {} bytes of clean markup.", out.len());
    String::from_utf8(out).map_err(|e| SieveError::MarkupParse(e.to_string()))
}
