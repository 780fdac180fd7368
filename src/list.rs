// Copyright © 2024 Andrea Corbellini and contributors
// SPDX-License-Identifier: BSD-3-Clause

//! Circular doubly-linked lists over externally stored nodes.
//!
//! A chain is never empty: a node that belongs to no other node is a chain of length 1 whose
//! `next` and `last` point to itself. All the operations below take `&mut self` (or `&self`) and
//! a node handle, so the same algorithms work both for segments living in a byte buffer and for
//! plain in-memory fixtures.

/// Access to the links of a circular list.
///
/// Implementors only need to provide raw link accessors; the splicing algorithms are provided
/// methods.
pub(crate) trait CircularList {
    type Node: Copy;

    fn get_next(&self, node: Self::Node) -> Self::Node;
    fn get_last(&self, node: Self::Node) -> Self::Node;
    fn set_next(&mut self, node: Self::Node, next: Self::Node);
    fn set_last(&mut self, node: Self::Node, last: Self::Node);
    fn is_same_node(&self, a: Self::Node, b: Self::Node) -> bool;
    fn is_null(&self, node: Self::Node) -> bool;

    /// Turns `node` into a chain of length 1. Does nothing if `node` is null.
    fn init_node(&mut self, node: Self::Node) {
        if self.is_null(node) {
            return;
        }
        self.set_next(node, node);
        self.set_last(node, node);
    }

    #[inline]
    fn next(&self, node: Self::Node) -> Self::Node {
        self.get_next(node)
    }

    #[inline]
    fn last(&self, node: Self::Node) -> Self::Node {
        self.get_last(node)
    }

    /// Splices the whole chain starting at `to_append` right after `node`.
    fn insert_list(&mut self, node: Self::Node, to_append: Self::Node) {
        if self.is_same_node(node, to_append) {
            return;
        }
        let after = self.next(node);
        let append_tail = self.last(to_append);

        self.set_next(node, to_append);
        self.set_last(to_append, node);
        self.set_next(append_tail, after);
        self.set_last(after, append_tail);
    }

    /// Splices the whole chain starting at `to_prepend` right before `head`.
    ///
    /// Following `next` from `to_prepend` visits the prepended chain first and then reaches
    /// `head`.
    fn prepend_list(&mut self, head: Self::Node, to_prepend: Self::Node) {
        if self.is_same_node(head, to_prepend) {
            return;
        }
        let tail = self.last(head);
        self.insert_list(tail, to_prepend);
    }

    /// Removes `node` from its chain and returns the node that followed it.
    ///
    /// If `node` was alone, `node` itself is returned.
    fn disconnect_node(&mut self, node: Self::Node) -> Self::Node {
        let next = self.next(node);
        let last = self.last(node);
        self.set_next(last, next);
        self.set_last(next, last);
        self.init_node(node);
        next
    }

    /// Exchanges the positions of `a` and `b`, which may belong to the same chain or to
    /// different chains.
    fn swap_nodes(&mut self, a: Self::Node, b: Self::Node) {
        if self.is_same_node(a, b) {
            return;
        }

        let a_single = self.is_single_node(a);
        let b_single = self.is_single_node(b);
        match (a_single, b_single) {
            (true, true) => return,
            (true, false) => return self.replace_node(b, a),
            (false, true) => return self.replace_node(a, b),
            (false, false) => {}
        }

        let a_next = self.next(a);
        let a_last = self.last(a);
        let b_next = self.next(b);
        let b_last = self.last(b);

        if self.is_same_node(a_next, b) && self.is_same_node(b_next, a) {
            // a chain of two: both orders are the same cycle
            return;
        }
        if self.is_same_node(b_next, a) {
            return self.swap_nodes(b, a);
        }
        if self.is_same_node(a_next, b) {
            self.set_next(a_last, b);
            self.set_last(b, a_last);
            self.set_next(b, a);
            self.set_last(a, b);
            self.set_next(a, b_next);
            self.set_last(b_next, a);
            return;
        }

        self.set_next(a_last, b);
        self.set_last(a_next, b);
        self.set_next(b_last, a);
        self.set_last(b_next, a);
        self.set_next(a, b_next);
        self.set_last(a, b_last);
        self.set_next(b, a_next);
        self.set_last(b, a_last);
    }

    /// Puts the singleton `replacement` where `node` is, leaving `node` as a singleton.
    fn replace_node(&mut self, node: Self::Node, replacement: Self::Node) {
        let before = self.last(node);
        self.insert_list(before, replacement);
        self.disconnect_node(node);
    }

    #[inline]
    fn is_single_node(&self, node: Self::Node) -> bool {
        self.is_same_node(self.next(node), node)
    }

    /// Number of nodes in the chain containing `node`.
    fn length(&self, node: Self::Node) -> usize {
        if self.is_null(node) {
            return 0;
        }
        let mut count = 1;
        let mut cur = self.next(node);
        while !self.is_same_node(cur, node) {
            count += 1;
            cur = self.next(cur);
        }
        count
    }

    /// Checks that `next` and `last` agree for every node of the chain containing `node`.
    fn validate_list(&self, node: Self::Node) -> bool {
        if self.is_null(node) {
            return false;
        }
        let mut cur = node;
        loop {
            let next = self.next(cur);
            let last = self.last(cur);
            if self.is_null(next) || self.is_null(last) {
                return false;
            }
            if !self.is_same_node(self.last(next), cur) || !self.is_same_node(self.next(last), cur)
            {
                return false;
            }
            cur = next;
            if self.is_same_node(cur, node) {
                return true;
            }
        }
    }

    /// Calls `f` once for every node of the chain starting at `begin`, in `next` order.
    ///
    /// The last node is captured before the walk starts and the following node is fetched before
    /// `f` runs, so `f` may unlink or rewrite the node it is given.
    fn for_each<F>(&mut self, begin: Self::Node, mut f: F)
    where
        F: FnMut(&mut Self, Self::Node),
    {
        if self.is_null(begin) {
            return;
        }
        let end = self.last(begin);
        let mut node = begin;
        loop {
            let next = self.next(node);
            let done = self.is_same_node(node, end);
            f(self, node);
            if done {
                break;
            }
            node = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    const NULL: usize = usize::MAX;

    #[derive(Clone, Debug)]
    struct Nodes {
        next: Vec<usize>,
        last: Vec<usize>,
    }

    impl Nodes {
        fn new(count: usize) -> Self {
            let mut nodes = Self {
                next: vec![NULL; count],
                last: vec![NULL; count],
            };
            for i in 0..count {
                nodes.init_node(i);
            }
            nodes
        }

        fn chain(&self, begin: usize) -> Vec<usize> {
            let mut out = Vec::new();
            let mut cur = begin;
            loop {
                out.push(cur);
                cur = self.next(cur);
                if cur == begin {
                    break out;
                }
            }
        }

        fn build(count: usize, order: &[usize]) -> Self {
            let mut nodes = Self::new(count);
            for &i in &order[1..] {
                nodes.prepend_list(order[0], i);
            }
            nodes
        }
    }

    impl CircularList for Nodes {
        type Node = usize;

        fn get_next(&self, node: usize) -> usize {
            self.next[node]
        }

        fn get_last(&self, node: usize) -> usize {
            self.last[node]
        }

        fn set_next(&mut self, node: usize, next: usize) {
            self.next[node] = next;
        }

        fn set_last(&mut self, node: usize, last: usize) {
            self.last[node] = last;
        }

        fn is_same_node(&self, a: usize, b: usize) -> bool {
            a == b
        }

        fn is_null(&self, node: usize) -> bool {
            node == NULL || node >= self.next.len()
        }
    }

    /// Same nodes, walked in the opposite direction.
    #[derive(Debug)]
    struct Reversed<'n>(&'n mut Nodes);

    impl CircularList for Reversed<'_> {
        type Node = usize;

        fn get_next(&self, node: usize) -> usize {
            self.0.get_last(node)
        }

        fn get_last(&self, node: usize) -> usize {
            self.0.get_next(node)
        }

        fn set_next(&mut self, node: usize, next: usize) {
            self.0.set_last(node, next)
        }

        fn set_last(&mut self, node: usize, last: usize) {
            self.0.set_next(node, last)
        }

        fn is_same_node(&self, a: usize, b: usize) -> bool {
            a == b
        }

        fn is_null(&self, node: usize) -> bool {
            self.0.is_null(node)
        }
    }

    #[test]
    fn init_node_ignores_null() {
        let mut nodes = Nodes::new(2);
        nodes.init_node(NULL);
        assert!(nodes.is_single_node(0));
        assert!(nodes.is_single_node(1));
        assert_eq!(nodes.length(NULL), 0);
        assert!(!nodes.validate_list(NULL));
    }

    #[test]
    fn prepend_keeps_order() {
        let nodes = Nodes::build(5, &[0, 1, 2, 3, 4]);
        assert_eq!(nodes.chain(0), [0, 1, 2, 3, 4]);
        assert_eq!(nodes.length(3), 5);
        assert!(nodes.validate_list(2));
    }

    #[test]
    fn prepend_same_node_is_noop() {
        let mut nodes = Nodes::build(3, &[0, 1, 2]);
        nodes.prepend_list(1, 1);
        nodes.insert_list(2, 2);
        assert_eq!(nodes.chain(0), [0, 1, 2]);
    }

    #[test]
    fn splice_whole_chains() {
        let mut nodes = Nodes::new(6);
        nodes.prepend_list(0, 1);
        nodes.prepend_list(0, 2);
        nodes.prepend_list(3, 4);
        nodes.prepend_list(3, 5);

        nodes.insert_list(1, 3);
        assert_eq!(nodes.chain(0), [0, 1, 3, 4, 5, 2]);
        assert!(nodes.validate_list(0));

        let mut nodes = Nodes::build(6, &[0, 1, 2]);
        nodes.prepend_list(3, 4);
        nodes.prepend_list(3, 5);
        nodes.prepend_list(0, 3);
        assert_eq!(nodes.chain(3), [3, 4, 5, 0, 1, 2]);
        assert!(nodes.validate_list(5));
    }

    #[test]
    fn disconnect() {
        let mut nodes = Nodes::build(4, &[0, 1, 2, 3]);
        assert_eq!(nodes.disconnect_node(2), 3);
        assert_eq!(nodes.chain(0), [0, 1, 3]);
        assert!(nodes.is_single_node(2));
        assert!(nodes.validate_list(0));

        assert_eq!(nodes.disconnect_node(3), 0);
        assert_eq!(nodes.disconnect_node(1), 0);
        assert!(nodes.is_single_node(0));
        assert_eq!(nodes.disconnect_node(0), 0);
        assert!(nodes.validate_list(0));
    }

    #[test]
    fn swap_distant() {
        let mut nodes = Nodes::build(6, &[0, 1, 2, 3, 4, 5]);
        nodes.swap_nodes(1, 4);
        assert_eq!(nodes.chain(0), [0, 4, 2, 3, 1, 5]);
        assert!(nodes.validate_list(0));
    }

    #[test]
    fn swap_adjacent() {
        let mut nodes = Nodes::build(4, &[0, 1, 2, 3]);
        nodes.swap_nodes(1, 2);
        assert_eq!(nodes.chain(0), [0, 2, 1, 3]);
        nodes.swap_nodes(1, 2);
        assert_eq!(nodes.chain(0), [0, 1, 2, 3]);
        assert!(nodes.validate_list(0));

        let mut nodes = Nodes::build(3, &[0, 1, 2]);
        nodes.swap_nodes(0, 1);
        assert_eq!(nodes.chain(0), [0, 2, 1]);
        assert!(nodes.validate_list(0));

        let mut nodes = Nodes::build(2, &[0, 1]);
        nodes.swap_nodes(0, 1);
        assert_eq!(nodes.chain(0), [0, 1]);
        assert!(nodes.validate_list(0));
    }

    #[test]
    fn swap_across_chains() {
        let mut nodes = Nodes::build(6, &[0, 1, 2]);
        nodes.prepend_list(3, 4);
        nodes.prepend_list(3, 5);
        nodes.swap_nodes(1, 4);
        assert_eq!(nodes.chain(0), [0, 4, 2]);
        assert_eq!(nodes.chain(3), [3, 1, 5]);
        assert!(nodes.validate_list(0));
        assert!(nodes.validate_list(3));
    }

    #[test]
    fn swap_with_singleton() {
        let mut nodes = Nodes::build(4, &[0, 1, 2]);
        nodes.swap_nodes(1, 3);
        assert_eq!(nodes.chain(0), [0, 3, 2]);
        assert!(nodes.is_single_node(1));
        assert!(nodes.validate_list(0));

        nodes.swap_nodes(1, 0);
        assert_eq!(nodes.chain(1), [1, 3, 2]);
        assert!(nodes.is_single_node(0));

        let mut nodes = Nodes::new(2);
        nodes.swap_nodes(0, 1);
        assert!(nodes.is_single_node(0));
        assert!(nodes.is_single_node(1));
    }

    #[test]
    fn reversed_walk() {
        let mut nodes = Nodes::build(4, &[0, 1, 2, 3]);
        let mut seen = Vec::new();
        let mut reversed = Reversed(&mut nodes);
        reversed.for_each(0, |_, node| seen.push(node));
        assert_eq!(seen, [0, 3, 2, 1]);

        reversed.disconnect_node(2);
        reversed.prepend_list(0, 2);
        assert!(reversed.validate_list(0));
        assert_eq!(nodes.chain(0), [0, 2, 1, 3]);
    }

    #[test]
    fn for_each_survives_disconnect() {
        let mut nodes = Nodes::build(5, &[0, 1, 2, 3, 4]);
        let mut seen = Vec::new();
        nodes.for_each(0, |nodes, node| {
            seen.push(node);
            nodes.disconnect_node(node);
        });
        assert_eq!(seen, [0, 1, 2, 3, 4]);
        for i in 0..5 {
            assert!(nodes.is_single_node(i));
        }
    }

    #[test]
    fn for_each_single() {
        let mut nodes = Nodes::new(1);
        let mut count = 0;
        nodes.for_each(0, |_, _| count += 1);
        assert_eq!(count, 1);
        nodes.for_each(NULL, |_, _| count += 1);
        assert_eq!(count, 1);
    }
}
