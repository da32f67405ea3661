//! Keyed Reconciliation
//!
//! [`plan`] diffs two ordered key lists into a [`Patch`]: which keys to
//! create, which to destroy and which `insert_before` moves turn the old
//! order into the new one. Keys on a longest increasing subsequence of
//! their old positions stay put, so the number of moves is minimal and a
//! pure permutation never destroys anything.
//!
//! [`KeyedList`] applies a patch to component instances living in some
//! [`ChildHost`]: a DOM element in the browser, a `Vec` in tests.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Place `key` directly before `anchor`, or at the end when `anchor` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertBefore<K> {
    pub key: K,
    pub anchor: Option<K>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch<K> {
    /// New keys, in desired order
    pub create: Vec<K>,
    /// Keys no longer present, in old order
    pub destroy: Vec<K>,
    /// Moves in application order. Created keys are placed here too.
    pub moves: Vec<InsertBefore<K>>,
}

impl<K> Default for Patch<K> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            destroy: Vec::new(),
            moves: Vec::new(),
        }
    }
}

impl<K: Clone + Eq> Patch<K> {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.destroy.is_empty() && self.moves.is_empty()
    }

    /// Replay the patch on a plain key list.
    pub fn apply_to(&self, list: &mut Vec<K>) {
        list.retain(|key| !self.destroy.contains(key));
        for InsertBefore { key, anchor } in &self.moves {
            if let Some(pos) = list.iter().position(|k| k == key) {
                list.remove(pos);
            }
            let at = anchor
                .as_ref()
                .and_then(|anchor| list.iter().position(|k| k == anchor))
                .unwrap_or(list.len());
            list.insert(at, key.clone());
        }
    }
}

/// Diff `current` into `desired`. Keys are expected to be unique; later
/// duplicates in `desired` are ignored.
pub fn plan<K: Clone + Eq + Hash>(current: &[K], desired: &[K]) -> Patch<K> {
    let mut seen = HashSet::with_capacity(desired.len());
    let desired: Vec<&K> = desired.iter().filter(|k| seen.insert(*k)).collect();
    let wanted: HashSet<&K> = desired.iter().copied().collect();

    let destroy: Vec<K> = current.iter().filter(|k| !wanted.contains(k)).cloned().collect();

    // Old positions among the survivors
    let old_pos: HashMap<&K, usize> = current
        .iter()
        .filter(|k| wanted.contains(k))
        .enumerate()
        .map(|(i, k)| (k, i))
        .collect();

    let create: Vec<K> = desired
        .iter()
        .filter(|k| !old_pos.contains_key(*k))
        .map(|k| (*k).clone())
        .collect();

    // Survivors in desired order, tagged with where they used to be
    let survivors: Vec<(usize, usize)> = desired
        .iter()
        .enumerate()
        .filter_map(|(i, k)| old_pos.get(*k).map(|&old| (i, old)))
        .collect();
    let stable: HashSet<usize> = longest_increasing(&survivors.iter().map(|&(_, old)| old).collect::<Vec<_>>())
        .into_iter()
        .map(|j| survivors[j].0)
        .collect();

    // Back to front: every anchor is already in its final place.
    let mut moves = Vec::new();
    for i in (0..desired.len()).rev() {
        if stable.contains(&i) {
            continue;
        }
        moves.push(InsertBefore {
            key: desired[i].clone(),
            anchor: desired.get(i + 1).map(|k| (*k).clone()),
        });
    }

    Patch { create, destroy, moves }
}

/// Indices of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<usize> {
    // tails[l] = index of the smallest tail of an increasing run of length l + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        let len = tails.partition_point(|&t| values[t] < value);
        if len > 0 {
            prev[i] = Some(tails[len - 1]);
        }
        if len == tails.len() {
            tails.push(i);
        } else {
            tails[len] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = prev[i];
    }
    result.reverse();
    result
}

/// A rendered child that survives across updates
pub trait Component {
    type Props;
    type Node;

    fn node(&self) -> &Self::Node;

    /// Apply new props in place
    fn update_props(&mut self, props: &Self::Props);

    /// Release listeners and subscriptions
    fn destroy(&mut self) {}
}

/// Container that child nodes are attached to
pub trait ChildHost {
    type Node;

    /// Attach or move `node` before `anchor` (append when `None`).
    fn insert_before(&mut self, node: &Self::Node, anchor: Option<&Self::Node>);

    fn remove(&mut self, node: &Self::Node);
}

/// Id-keyed children of one list-shaped view
pub struct KeyedList<K, C> {
    order: Vec<K>,
    instances: HashMap<K, C>,
}

impl<K, C> Default for KeyedList<K, C> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            instances: HashMap::new(),
        }
    }
}

impl<K, C> KeyedList<K, C>
where
    K: Clone + Eq + Hash,
    C: Component,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the children in line with `desired`. `create` builds instances
    /// for keys seen for the first time; everything else is reused.
    pub fn update<H>(
        &mut self,
        host: &mut H,
        desired: Vec<(K, C::Props)>,
        mut create: impl FnMut(&K, &C::Props) -> C,
    ) -> Patch<K>
    where
        H: ChildHost<Node = C::Node>,
    {
        self.try_update(host, desired, |key, props| Some(create(key, props)))
    }

    /// Like [`update`](Self::update), but `create` may fail. Keys it
    /// cannot build are left out of the list.
    pub fn try_update<H>(
        &mut self,
        host: &mut H,
        desired: Vec<(K, C::Props)>,
        mut create: impl FnMut(&K, &C::Props) -> Option<C>,
    ) -> Patch<K>
    where
        H: ChildHost<Node = C::Node>,
    {
        let mut fresh: HashMap<K, C> = HashMap::new();
        let desired: Vec<(K, C::Props)> = desired
            .into_iter()
            .filter(|(key, props)| {
                if self.instances.contains_key(key) || fresh.contains_key(key) {
                    return true;
                }
                match create(key, props) {
                    Some(instance) => {
                        fresh.insert(key.clone(), instance);
                        true
                    }
                    None => false,
                }
            })
            .collect();

        let keys: Vec<K> = desired.iter().map(|(k, _)| k.clone()).collect();
        let patch = plan(&self.order, &keys);

        for key in &patch.destroy {
            if let Some(mut instance) = self.instances.remove(key) {
                host.remove(instance.node());
                instance.destroy();
            }
        }

        for (key, props) in &desired {
            match fresh.remove(key) {
                Some(instance) => {
                    self.instances.insert(key.clone(), instance);
                }
                None => {
                    if let Some(instance) = self.instances.get_mut(key) {
                        instance.update_props(props);
                    }
                }
            }
        }

        for InsertBefore { key, anchor } in &patch.moves {
            let Some(instance) = self.instances.get(key) else {
                continue;
            };
            let anchor = anchor
                .as_ref()
                .and_then(|a| self.instances.get(a))
                .map(Component::node);
            host.insert_before(instance.node(), anchor);
        }

        let mut seen = HashSet::new();
        self.order = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        patch
    }

    /// Destroy every child.
    pub fn clear<H>(&mut self, host: &mut H)
    where
        H: ChildHost<Node = C::Node>,
    {
        for key in self.order.drain(..) {
            if let Some(mut instance) = self.instances.remove(&key) {
                host.remove(instance.node());
                instance.destroy();
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&C> {
        self.instances.get(key)
    }

    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Instances in display order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &C)> {
        self.order
            .iter()
            .filter_map(|k| self.instances.get(k).map(|c| (k, c)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
