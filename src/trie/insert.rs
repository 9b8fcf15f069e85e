use super::{Counts, Label, NodeId, Trie, TrieError};

/// Traversal state for a single insertion. Lives on the caller's stack and
/// is threaded through every step, never stored on the trie.
struct PathContext<'r> {
    response: &'r str,
    /// Byte length of `response` consumed before the current step.
    consumed: usize,
    /// Copy of the most recent non-empty counts seen along the path.
    snapshot: Counts,
    /// Nodes along the path, before the current one, that hold counts.
    with_counts: Vec<NodeId>,
}

impl<'r> PathContext<'r> {
    fn new(response: &'r str) -> Self {
        Self {
            response,
            consumed: 0,
            snapshot: Counts::new(),
            with_counts: Vec::new(),
        }
    }

    /// Characters consumed so far, trimmed.
    fn inserted(&self) -> &'r str {
        self.response[..self.consumed].trim()
    }
}

impl Trie {
    /// Insert one response. Each character becomes an edge, followed by a
    /// final `Label::End` edge; repeating a response reuses its path and
    /// bumps its counts.
    ///
    /// Fails only when a ranking has to be computed under an invalid
    /// suggestion limit. Updates applied before the failure are kept.
    pub fn insert(&mut self, response: &str) -> Result<(), TrieError> {
        let mut ctx = PathContext::new(response);
        let mut current = NodeId::ROOT;

        for (offset, ch) in response.char_indices() {
            current = self.visit(&mut ctx, current, Label::Char(ch))?;
            ctx.consumed = offset + ch.len_utf8();
        }
        self.visit(&mut ctx, current, Label::End)?;

        self.responses += 1;
        Ok(())
    }

    /// Step from `current` to its child labeled `label`, creating it when
    /// missing, and do the count bookkeeping for the transition.
    fn visit(&mut self, ctx: &mut PathContext<'_>, current: NodeId, label: Label) -> Result<NodeId, TrieError> {
        if !self.node(current).counts.is_empty() {
            ctx.snapshot = self.node(current).counts.clone();
        }

        let next = match self.node(current).child_for(label) {
            Some(id) => id,
            None => {
                if self.node(current).has_children() {
                    self.branch(ctx, current)?;
                }
                self.create_child(current, label)?
            }
        };

        if current == NodeId::ROOT || self.node(current).branched {
            self.record_partial(ctx, current)?;

            let limit = self.max_suggestions;
            self.node_mut(next).record_count(ctx.response, 1, limit)?;
        }

        if !self.node(current).counts.is_empty() {
            ctx.with_counts.push(current);
        }

        Ok(next)
    }

    /// A new response leaves the path at `current`. If the path below was
    /// linear until now, its sole child has been relying on an ancestor's
    /// counts, which include the departing response; hand it those counts
    /// without it.
    fn branch(&mut self, ctx: &PathContext<'_>, current: NodeId) -> Result<(), TrieError> {
        let node = self.node(current);
        if node.branched || current == NodeId::ROOT {
            return Ok(());
        }
        let Some((_, sole)) = node.children().next() else {
            return Ok(());
        };

        log::trace!(
            "branch at node {} after {:?}",
            current.index(),
            ctx.inserted()
        );

        let mut counts = ctx.snapshot.clone();
        counts.remove(ctx.response);
        let limit = self.max_suggestions;
        self.node_mut(sole).set_counts(counts, limit)
    }

    /// Record the words consumed so far as a candidate of their own when the
    /// path sits on a word boundary and the phrase is long enough. The
    /// candidate goes to every node along the path that holds counts.
    fn record_partial(&mut self, ctx: &PathContext<'_>, current: NodeId) -> Result<(), TrieError> {
        if !self.node(current).label.is_word_boundary() {
            return Ok(());
        }

        let phrase = ctx.inserted();
        if phrase.split(' ').count() < self.min_words_partial {
            return Ok(());
        }

        // A phrase not seen yet is shared by every response counted so far.
        let delta = if ctx.snapshot.contains(phrase) {
            1
        } else {
            ctx.snapshot.total()
        };

        let limit = self.max_suggestions;
        for id in &ctx.with_counts {
            self.node_mut(*id).record_count(phrase, delta, limit)?;
        }
        Ok(())
    }
}
