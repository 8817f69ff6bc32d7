//! Depth-first traversal over a document tree.
//!
//! [`Visitor::visit`] dispatches on the node kind to a `visit_*` handler.
//! Every handler defaults to [`Visitor::generic_visit`], which recurses into
//! the children. A handler that overrides one of these and still wants the
//! children visited must call `generic_visit` itself.

use super::tree::{Node, NodeKind};

pub trait Visitor {
    type Error;

    fn visit(&mut self, node: &Node) -> Result<(), Self::Error> {
        match &node.kind {
            NodeKind::Heading { .. } => self.visit_heading(node),
            NodeKind::Link { .. } => self.visit_link(node),
            NodeKind::Image { .. } => self.visit_image(node),
            NodeKind::Text(_) => self.visit_text(node),
            NodeKind::BlockMath(_) => self.visit_block_math(node),
            NodeKind::InlineMath(_) => self.visit_inline_math(node),
            _ => self.generic_visit(node),
        }
    }

    fn visit_heading(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    fn visit_link(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    fn visit_image(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    fn visit_text(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    fn visit_block_math(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    fn visit_inline_math(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.generic_visit(node)
    }

    /// Fallback handler: announce the node, then visit each child in order.
    fn generic_visit(&mut self, node: &Node) -> Result<(), Self::Error> {
        self.enter(node);
        for child in &node.children {
            self.visit(child)?;
        }
        self.leave(node);
        Ok(())
    }

    /// Called by [`Visitor::generic_visit`] before the children.
    fn enter(&mut self, _node: &Node) {}

    /// Called by [`Visitor::generic_visit`] after the children.
    fn leave(&mut self, _node: &Node) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownProcessor;

    /// Counts nodes reached through the fallback handler.
    #[derive(Default)]
    struct NodeCounter {
        count: usize,
    }

    impl Visitor for NodeCounter {
        type Error = std::convert::Infallible;

        fn enter(&mut self, _node: &Node) {
            self.count += 1;
        }
    }

    #[derive(Default)]
    struct LinkCollector {
        destinations: Vec<String>,
        headings: usize,
    }

    impl Visitor for LinkCollector {
        type Error = ();

        fn visit_link(&mut self, node: &Node) -> Result<(), ()> {
            if let NodeKind::Link { destination, .. } = &node.kind {
                self.destinations.push(destination.clone());
            }
            Ok(())
        }

        fn visit_heading(&mut self, node: &Node) -> Result<(), ()> {
            self.headings += 1;
            self.generic_visit(node)
        }
    }

    #[test]
    fn test_counts_every_node() {
        let doc = MarkdownProcessor::new().parse("# Title\n\nSome *text*.");
        let mut counter = NodeCounter::default();
        counter.visit(&doc).unwrap();
        // document, heading, text, paragraph, text, emphasis, text, text
        assert_eq!(counter.count, 8);
    }

    #[test]
    fn test_dispatch_and_explicit_recursion() {
        let doc = MarkdownProcessor::new()
            .parse("# About [a](a.md)\n\nSee [b](b.md) and [c](https://c.example).");
        let mut collector = LinkCollector::default();
        collector.visit(&doc).unwrap();
        assert_eq!(collector.headings, 1);
        assert_eq!(collector.destinations, vec!["a.md", "b.md", "https://c.example"]);
    }

    #[test]
    fn test_errors_stop_traversal() {
        struct FailOnImage(usize);
        impl Visitor for FailOnImage {
            type Error = String;
            fn visit_image(&mut self, _node: &Node) -> Result<(), String> {
                Err("image".into())
            }
            fn visit_text(&mut self, node: &Node) -> Result<(), String> {
                self.0 += 1;
                self.generic_visit(node)
            }
        }

        let doc = MarkdownProcessor::new().parse("one\n\n![pic](p.png)\n\ntwo");
        let mut visitor = FailOnImage(0);
        assert_eq!(visitor.visit(&doc), Err("image".to_string()));
        assert_eq!(visitor.0, 1);
    }
}
