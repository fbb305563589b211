use crate::engine::{Board, Move};
use crate::pool::{Handle, Pool, PoolError};

/// Side to act at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The player slides; children are one per legal direction.
    Player,
    /// A tile gets placed; the single child is the adversarial placement.
    Computer,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub board: Board,
    /// Direction that led here (inherited through computer replies).
    pub dir: Option<Move>,
    /// `None` on a recycled slot until the node is filled in.
    pub turn: Option<Turn>,
    /// Result of the last value pass through this node.
    pub value: f64,
    parent: Option<Handle>,
    children: Vec<Handle>,
}

impl Node {
    pub fn new(board: Board, dir: Option<Move>, turn: Turn) -> Self {
        Node { board, dir, turn: Some(turn), ..Node::default() }
    }

    #[inline]
    pub fn children(&self) -> &[Handle] { &self.children }

    #[inline]
    pub fn parent(&self) -> Option<Handle> { self.parent }

    #[inline]
    pub fn is_leaf(&self) -> bool { self.children.is_empty() }
}

/// Game tree kept across turns. Nodes live in a [`Pool`]; links are handles.
#[derive(Debug, Default)]
pub struct GameTree {
    pool: Pool<Node>,
    root: Option<Handle>,
}

impl GameTree {
    pub fn new() -> Self { Self::default() }

    /// Tree that holds at most `limit` nodes at once.
    pub fn with_node_limit(limit: usize) -> Self { Self { pool: Pool::with_limit(limit), root: None } }

    #[inline]
    pub fn root(&self) -> Option<Handle> { self.root }

    #[inline]
    pub fn node(&self, h: Handle) -> Option<&Node> { self.pool.get(h) }

    #[inline]
    pub fn node_mut(&mut self, h: Handle) -> Option<&mut Node> { self.pool.get_mut(h) }

    /// `i`-th child of `h`, in insertion order.
    #[inline]
    pub fn child(&self, h: Handle, i: usize) -> Option<Handle> {
        self.pool.get(h).and_then(|n| n.children.get(i).copied())
    }

    /// Live nodes.
    #[inline]
    pub fn len(&self) -> usize { self.pool.live() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.root.is_none() }

    /// Attach `node` as the last child of `parent`.
    pub fn insert(&mut self, parent: Handle, mut node: Node) -> Result<Handle, PoolError> {
        if !self.pool.contains(parent) {
            return Err(PoolError::Stale);
        }
        node.parent = Some(parent);
        node.children.clear();
        let h = self.pool.acquire()?;
        if let Some(slot) = self.pool.get_mut(h) {
            *slot = node;
        }
        if let Some(p) = self.pool.get_mut(parent) {
            p.children.push(h);
        }
        Ok(h)
    }

    /// Drop everything and start over from a single player-turn root.
    pub fn seed(&mut self, board: Board) -> Result<Handle, PoolError> {
        self.clear();
        let h = self.pool.acquire()?;
        if let Some(slot) = self.pool.get_mut(h) {
            *slot = Node::new(board, None, Turn::Player);
        }
        self.root = Some(h);
        Ok(h)
    }

    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            self.release_subtree(root);
        }
    }

    /// First node in pre-order (node, then its children left to right) matching `pred`.
    pub fn find(&self, pred: impl Fn(&Node) -> bool) -> Option<Handle> {
        let mut stack: Vec<Handle> = self.root.into_iter().collect();
        while let Some(h) = stack.pop() {
            let Some(node) = self.pool.get(h) else { continue };
            if pred(node) {
                return Some(h);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Make `h` the root, releasing every node outside its subtree.
    pub fn reroot(&mut self, h: Handle) {
        let Some(old_root) = self.root else { return };
        if old_root == h || !self.pool.contains(h) {
            return;
        }
        let mut stack = vec![old_root];
        while let Some(cur) = stack.pop() {
            if cur == h {
                continue;
            }
            if let Some(node) = self.pool.get_mut(cur) {
                stack.append(&mut node.children);
            }
            self.pool.release(cur);
        }
        if let Some(node) = self.pool.get_mut(h) {
            node.parent = None;
        }
        self.root = Some(h);
    }

    /// Levels from the root to the deepest leaf; a lone root is depth 1.
    pub fn depth(&self) -> u32 {
        let mut deepest = 0;
        let mut stack: Vec<(Handle, u32)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((h, level)) = stack.pop() {
            let Some(node) = self.pool.get(h) else { continue };
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|&c| (c, level + 1)));
        }
        deepest
    }

    /// Handles of all childless nodes, pre-order.
    pub fn leaves(&self) -> Vec<Handle> {
        let mut out = Vec::new();
        let mut stack: Vec<Handle> = self.root.into_iter().collect();
        while let Some(h) = stack.pop() {
            let Some(node) = self.pool.get(h) else { continue };
            if node.is_leaf() {
                out.push(h);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn release_subtree(&mut self, top: Handle) {
        let mut stack = vec![top];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.pool.get_mut(h) {
                stack.append(&mut node.children);
            }
            self.pool.release(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(raw: u64) -> Board { Board::from_raw(raw) }

    /// root -> [a -> [a1], b]
    fn small_tree() -> (GameTree, [Handle; 4]) {
        let mut t = GameTree::new();
        let root = t.seed(b(1)).unwrap();
        let a = t.insert(root, Node::new(b(2), Some(Move::Up), Turn::Computer)).unwrap();
        let bb = t.insert(root, Node::new(b(3), Some(Move::Left), Turn::Computer)).unwrap();
        let a1 = t.insert(a, Node::new(b(4), Some(Move::Up), Turn::Player)).unwrap();
        (t, [root, a, bb, a1])
    }

    #[test]
    fn depth_and_leaves() {
        let (t, [root, a, bb, a1]) = small_tree();
        assert_eq!(t.len(), 4);
        assert_eq!(t.depth(), 3);
        assert_eq!(t.leaves(), vec![a1, bb]);
        assert_eq!(t.child(root, 0), Some(a));
        assert_eq!(t.child(root, 2), None);
        assert_eq!(t.node(a1).unwrap().parent(), Some(a));
        assert_eq!(GameTree::new().depth(), 0);
    }

    #[test]
    fn find_is_preorder() {
        let (t, [_, a, _, a1]) = small_tree();
        assert_eq!(t.find(|n| n.turn == Some(Turn::Computer)), Some(a));
        assert_eq!(t.find(|n| n.board == b(4) && n.turn == Some(Turn::Player)), Some(a1));
        assert_eq!(t.find(|n| n.board == b(99)), None);
    }

    #[test]
    fn reroot_keeps_only_the_subtree() {
        let (mut t, [root, a, bb, a1]) = small_tree();
        t.reroot(a);
        assert_eq!(t.root(), Some(a));
        assert_eq!(t.len(), 2);
        assert!(t.node(root).is_none());
        assert!(t.node(bb).is_none());
        assert_eq!(t.node(a).unwrap().parent(), None);
        assert_eq!(t.leaves(), vec![a1]);
        assert_eq!(t.depth(), 2);
    }

    #[test]
    fn recycled_slots_come_back_blank() {
        let mut pool: Pool<Node> = Pool::new();
        let h = pool.acquire().unwrap();
        *pool.get_mut(h).unwrap() = Node { value: 3.5, parent: Some(h), ..Node::new(b(9), Some(Move::Down), Turn::Computer) };
        assert!(pool.release(h));

        let again = pool.acquire().unwrap();
        assert_eq!(again.index(), h.index());
        let n = pool.get(again).unwrap();
        assert_eq!(n.board, Board::default());
        assert_eq!(n.turn, None);
        assert_eq!(n.dir, None);
        assert_eq!(n.value, 0.0);
        assert_eq!(n.parent(), None);
        assert!(n.is_leaf());
    }

    #[test]
    fn seed_recycles_nodes() {
        let (mut t, [root, ..]) = small_tree();
        let fresh = t.seed(b(7)).unwrap();
        assert_eq!(t.len(), 1);
        assert!(t.node(root).is_none());
        let node = t.node(fresh).unwrap();
        assert_eq!(node.board, b(7));
        assert!(node.is_leaf());
    }

    #[test]
    fn node_limit_stops_insertion() {
        let mut t = GameTree::with_node_limit(2);
        let root = t.seed(b(1)).unwrap();
        t.insert(root, Node::new(b(2), None, Turn::Computer)).unwrap();
        assert_eq!(
            t.insert(root, Node::new(b(3), None, Turn::Computer)),
            Err(PoolError::Exhausted { capacity: 2 })
        );
        assert_eq!(t.node(root).unwrap().children().len(), 1);
    }
}
