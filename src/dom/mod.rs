//! DOM snapshot and mutation module
//!
//! This module provides the page model the quiz engine reads and writes:
//! - ElementNode: serializable snapshot of a DOM node, including live form state
//! - DomTree: arena over a snapshot with predicate queries and journaled writes
//! - Mutation: journal entries replayed against the live page
//! - html: conversion of static HTML into a DomTree

pub mod element;
pub mod html;
pub mod mutation;
pub mod tree;

pub use element::{ElementNode, TEXT_TAG};
pub use html::{parse_document, parse_html};
pub use mutation::{DomEvent, Mutation};
pub use tree::{DomTree, NODE_KEY_ATTR, NodeId};
