//! Builds the tree-as-list from a filtered, ordered record list.
//!
//! With sub-packages shown, hidden ancestors of matches are pulled in as
//! anchors, non-excluded children of every visible record are re-inserted
//! level by level, and each parent is followed directly by its children
//! sorted by name. Grouping then applies to the resulting root units.

use std::cmp::Ordering;
use std::sync::Arc;

use fnv::{FnvHashMap, FnvHashSet};

use crate::sort::compare_ignore_case;
use crate::store::{RecordStore, TagCatalog};
use crate::types::{Record, RecordId};

use super::{GroupingMode, LeafKind, TreeNode};

/// A root record and everything nested beneath it, at depths relative to the root.
struct Unit {
    root: Arc<Record>,
    nodes: Vec<TreeNode>,
}

impl Unit {
    fn single(record: Arc<Record>) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf {
                record: record.clone(),
                depth: 0,
                kind: LeafKind::Match,
            }],
            root: record,
        }
    }

    fn extend_into(&self, out: &mut Vec<TreeNode>, offset: usize) {
        out.extend(self.nodes.iter().map(|node| node.shifted(offset)));
    }
}

type Siblings = FnvHashMap<RecordId, Vec<(Arc<Record>, LeafKind)>>;

pub struct TreeBuilder<'a> {
    store: &'a RecordStore,
    tags: &'a TagCatalog,
    grouping: GroupingMode,
    show_sub_packages: bool,
    ungrouped_label: &'a str,
    untagged_label: &'a str,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a RecordStore, tags: &'a TagCatalog) -> Self {
        Self {
            store,
            tags,
            grouping: GroupingMode::None,
            show_sub_packages: true,
            ungrouped_label: "-none-",
            untagged_label: "-untagged-",
        }
    }

    pub fn grouping(mut self, grouping: GroupingMode) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn show_sub_packages(mut self, show: bool) -> Self {
        self.show_sub_packages = show;
        self
    }

    pub fn labels(mut self, ungrouped: &'a str, untagged: &'a str) -> Self {
        self.ungrouped_label = ungrouped;
        self.untagged_label = untagged;
        self
    }

    pub fn build(&self, records: &[Arc<Record>]) -> Vec<TreeNode> {
        let units = if self.show_sub_packages {
            self.hierarchy(records)
        } else {
            records.iter().cloned().map(Unit::single).collect()
        };

        let mut nodes = Vec::with_capacity(units.iter().map(|unit| unit.nodes.len()).sum());
        match self.grouping {
            GroupingMode::None => {
                for unit in &units {
                    unit.extend_into(&mut nodes, 0);
                }
            }
            GroupingMode::Tag => self.group_by_tag(&units, &mut nodes),
            _ => self.group_by_key(units, &mut nodes),
        }
        nodes
    }

    fn hierarchy(&self, records: &[Arc<Record>]) -> Vec<Unit> {
        let mut order: Vec<(Arc<Record>, LeafKind)> = Vec::with_capacity(records.len());
        let mut present: FnvHashSet<RecordId> = FnvHashSet::default();
        let mut anchors: FnvHashMap<RecordId, usize> = FnvHashMap::default();
        for record in records {
            if present.contains(&record.id) {
                // An ancestor pulled in earlier that matches in its own right.
                if let Some(&position) = anchors.get(&record.id) {
                    order[position].1 = LeafKind::Match;
                }
                continue;
            }
            for anchor in self.missing_ancestors(record, &present) {
                present.insert(anchor.id);
                anchors.insert(anchor.id, order.len());
                order.push((anchor, LeafKind::Anchor));
            }
            present.insert(record.id);
            order.push((record.clone(), LeafKind::Match));
        }

        self.reinsert_children(&mut order, &mut present);
        self.assemble(&order, &present)
    }

    /// Ancestors of `record` that are not yet visible, top-most first. Stops at
    /// the first lookup miss or repeated id.
    fn missing_ancestors(&self, record: &Record, present: &FnvHashSet<RecordId>) -> Vec<Arc<Record>> {
        let mut chain = Vec::new();
        let mut seen = FnvHashSet::default();
        seen.insert(record.id);
        let mut parent_id = record.parent_id;
        while parent_id > 0 && !present.contains(&parent_id) {
            if !seen.insert(parent_id) {
                log::warn!(
                    "parent cycle cut record={} parent={}",
                    record.id,
                    parent_id
                );
                break;
            }
            let Some(parent) = self.store.get(parent_id) else {
                break;
            };
            chain.push(parent.clone());
            parent_id = parent.parent_id;
        }
        chain.reverse();
        chain
    }

    fn reinsert_children(
        &self,
        order: &mut Vec<(Arc<Record>, LeafKind)>,
        present: &mut FnvHashSet<RecordId>,
    ) {
        let Some(max_depth) = self.store.max_child_depth() else {
            return;
        };

        let mut children: FnvHashMap<RecordId, Vec<Arc<Record>>> = FnvHashMap::default();
        for record in self.store.all() {
            if !record.is_top_level() && !record.excluded && record.parent_id != record.id {
                children
                    .entry(record.parent_id)
                    .or_default()
                    .push(record.clone());
            }
        }
        if children.is_empty() {
            return;
        }

        let mut frontier: Vec<RecordId> = order.iter().map(|(record, _)| record.id).collect();
        for _level in 1..=max_depth {
            let mut next = Vec::new();
            for parent in &frontier {
                let Some(kids) = children.get(parent) else {
                    continue;
                };
                for child in kids {
                    if present.insert(child.id) {
                        order.push((child.clone(), LeafKind::Child));
                        next.push(child.id);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
    }

    /// Splits the visible records into root units, placing each parent's
    /// children directly beneath it in name order.
    fn assemble(&self, order: &[(Arc<Record>, LeafKind)], present: &FnvHashSet<RecordId>) -> Vec<Unit> {
        let mut siblings: Siblings = FnvHashMap::default();
        let mut roots = Vec::new();
        for (record, kind) in order {
            let nested = !record.is_top_level()
                && record.parent_id != record.id
                && present.contains(&record.parent_id);
            if nested {
                siblings
                    .entry(record.parent_id)
                    .or_default()
                    .push((record.clone(), *kind));
            } else {
                roots.push((record.clone(), *kind));
            }
        }
        for group in siblings.values_mut() {
            group.sort_by(|a, b| by_name(&a.0, &b.0));
        }

        let mut emitted = FnvHashSet::default();
        let mut units = Vec::with_capacity(roots.len());
        for (root, kind) in roots {
            units.push(self.unit(root, kind, &siblings, &mut emitted));
        }
        // Only records on a parent cycle are left; each cycle becomes one unit.
        for (record, kind) in order {
            if !emitted.contains(&record.id) {
                units.push(self.unit(record.clone(), *kind, &siblings, &mut emitted));
            }
        }
        units
    }

    fn unit(
        &self,
        root: Arc<Record>,
        kind: LeafKind,
        siblings: &Siblings,
        emitted: &mut FnvHashSet<RecordId>,
    ) -> Unit {
        let mut nodes = Vec::new();
        let mut stack = vec![(root.clone(), kind, 0usize)];
        while let Some((record, kind, depth)) = stack.pop() {
            if !emitted.insert(record.id) {
                log::warn!(
                    "parent cycle cut record={} parent={}",
                    record.id,
                    record.parent_id
                );
                continue;
            }
            let id = record.id;
            let feature = record.feature;
            nodes.push(TreeNode::Leaf {
                record: record.clone(),
                depth,
                kind,
            });
            if feature {
                self.push_feature_dependencies(&record, depth + 1, &mut nodes);
            }
            if let Some(children) = siblings.get(&id) {
                for (child, child_kind) in children.iter().rev() {
                    stack.push((child.clone(), *child_kind, depth + 1));
                }
            }
        }
        Unit { root, nodes }
    }

    fn push_feature_dependencies(&self, feature: &Record, depth: usize, nodes: &mut Vec<TreeNode>) {
        // Not loaded yet.
        let Some(dependencies) = &feature.dependencies else {
            return;
        };
        for safe_name in dependencies {
            match self.store.find_by_safe_name(safe_name) {
                Some(dependency) => nodes.push(TreeNode::Leaf {
                    record: dependency.clone(),
                    depth,
                    kind: LeafKind::Feature,
                }),
                None => log::debug!(
                    "feature dependency not in catalog feature={} dependency={}",
                    feature.id,
                    safe_name
                ),
            }
        }
    }

    fn key_path(&self, record: &Record) -> Vec<String> {
        let path: Vec<String> = match self.grouping {
            GroupingMode::Category => record
                .category
                .split('/')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            GroupingMode::Publisher => single_segment(&record.publisher),
            GroupingMode::State => single_segment(&record.official_state),
            GroupingMode::Location => single_segment(&record.location),
            GroupingMode::None | GroupingMode::Tag => Vec::new(),
        };
        if path.is_empty() {
            vec![self.ungrouped_label.to_string()]
        } else {
            path
        }
    }

    fn group_by_key(&self, units: Vec<Unit>, out: &mut Vec<TreeNode>) {
        let mut keyed: Vec<(Vec<String>, Unit)> = units
            .into_iter()
            .map(|unit| (self.key_path(&unit.root), unit))
            .collect();
        keyed.sort_by(|a, b| compare_paths(&a.0, &b.0));

        let mut previous: Vec<String> = Vec::new();
        for (path, unit) in &keyed {
            let shared = shared_prefix(&previous, path);
            let first_header = if shared == path.len() && shared == previous.len() {
                path.len()
            } else {
                shared.min(path.len().saturating_sub(1))
            };
            for (depth, segment) in path.iter().enumerate().skip(first_header) {
                out.push(TreeNode::Group {
                    label: segment.clone(),
                    depth,
                });
            }
            unit.extend_into(out, path.len());
            previous.clone_from(path);
        }
    }

    /// A unit sits under a tag when its root or any matching leaf carries it.
    fn unit_has_tag(&self, unit: &Unit, name: &str) -> bool {
        self.tags.is_member(&unit.root, name)
            || unit.nodes.iter().any(|node| match node {
                TreeNode::Leaf {
                    record,
                    kind: LeafKind::Match,
                    ..
                } => self.tags.is_member(record, name),
                _ => false,
            })
    }

    fn group_by_tag(&self, units: &[Unit], out: &mut Vec<TreeNode>) {
        for tag in self.tags.tags() {
            let mut members = units
                .iter()
                .filter(|unit| self.unit_has_tag(unit, &tag.name))
                .peekable();
            if members.peek().is_none() {
                continue;
            }
            out.push(TreeNode::Group {
                label: tag.name.clone(),
                depth: 0,
            });
            for unit in members {
                unit.extend_into(out, 1);
            }
        }

        let mut untagged = units
            .iter()
            .filter(|unit| {
                !self
                    .tags
                    .tags()
                    .iter()
                    .any(|tag| self.unit_has_tag(unit, &tag.name))
            })
            .peekable();
        if untagged.peek().is_some() {
            out.push(TreeNode::Group {
                label: self.untagged_label.to_string(),
                depth: 0,
            });
            for unit in untagged {
                unit.extend_into(out, 1);
            }
        }
    }
}

fn single_segment(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

fn by_name(a: &Record, b: &Record) -> Ordering {
    compare_ignore_case(&a.display_name, &b.display_name).then(a.id.cmp(&b.id))
}

fn compare_paths(a: &[String], b: &[String]) -> Ordering {
    for (left, right) in a.iter().zip(b) {
        match compare_ignore_case(left, right) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    a.len().cmp(&b.len())
}

fn shared_prefix(a: &[String], b: &[String]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(left, right)| compare_ignore_case(left, right) == Ordering::Equal)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TagInfo;

    fn render(nodes: &[TreeNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| match node {
                TreeNode::Group { label, depth } => format!("{depth}:[{label}]"),
                TreeNode::Leaf { record, depth, .. } => format!("{depth}:{}", record.display_name),
            })
            .collect()
    }

    fn shared(store: &RecordStore, ids: &[RecordId]) -> Vec<Arc<Record>> {
        ids.iter()
            .filter_map(|id| store.get(*id).cloned())
            .collect()
    }

    #[test]
    fn category_paths_emit_nested_headers() {
        let store = RecordStore::from_records([
            Record::new(1, "Stone Texture").with_category("Materials/Stone"),
            Record::new(2, "Hero Model").with_category("Characters"),
            Record::new(3, "Wood Texture").with_category("Materials/Wood"),
        ]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags)
            .grouping(GroupingMode::Category)
            .build(&shared(&store, &[1, 2, 3]));

        assert_eq!(
            render(&nodes),
            vec![
                "0:[Characters]",
                "1:Hero Model",
                "0:[Materials]",
                "1:[Stone]",
                "2:Stone Texture",
                "1:[Wood]",
                "2:Wood Texture",
            ]
        );
    }

    #[test]
    fn empty_keys_fall_under_ungrouped_label() {
        let store = RecordStore::from_records([
            Record::new(1, "Loose").with_publisher(""),
            Record::new(2, "Branded").with_publisher("Acme"),
        ]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags)
            .grouping(GroupingMode::Publisher)
            .labels("(none)", "-untagged-")
            .build(&shared(&store, &[1, 2]));
        assert_eq!(render(&nodes), vec!["0:[(none)]", "1:Loose", "0:[Acme]", "1:Branded"]);
    }

    #[test]
    fn children_are_contiguous_and_sorted_beneath_parent() {
        let store = RecordStore::from_records([
            Record::new(1, "Pack"),
            Record::new(2, "zeta part").with_parent(1),
            Record::new(3, "Other"),
            Record::new(4, "Alpha part").with_parent(1),
            Record::new(5, "inner").with_parent(4),
        ]);
        let tags = TagCatalog::default();
        // Filter order interleaves children with an unrelated record.
        let nodes = TreeBuilder::new(&store, &tags).build(&shared(&store, &[2, 3, 4]));

        assert_eq!(
            render(&nodes),
            vec!["0:Pack", "1:Alpha part", "2:inner", "1:zeta part", "0:Other"]
        );
        let kinds: Vec<LeafKind> = nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Leaf { kind, .. } => Some(*kind),
                TreeNode::Group { .. } => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                LeafKind::Anchor,
                LeafKind::Match,
                LeafKind::Child,
                LeafKind::Match,
                LeafKind::Match,
            ]
        );
    }

    #[test]
    fn excluded_children_are_not_reinserted() {
        let mut hidden = Record::new(3, "Hidden part").with_parent(1);
        hidden.excluded = true;
        let store = RecordStore::from_records([
            Record::new(1, "Pack"),
            Record::new(2, "Visible part").with_parent(1),
            hidden,
        ]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags).build(&shared(&store, &[1]));
        assert_eq!(render(&nodes), vec!["0:Pack", "1:Visible part"]);
    }

    #[test]
    fn sub_packages_can_be_hidden() {
        let store = RecordStore::from_records([
            Record::new(1, "Pack"),
            Record::new(2, "Part").with_parent(1),
        ]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags)
            .show_sub_packages(false)
            .build(&shared(&store, &[2]));
        assert_eq!(render(&nodes), vec!["0:Part"]);
    }

    #[test]
    fn orphans_with_missing_parents_become_roots() {
        let store = RecordStore::from_records([Record::new(2, "Orphan").with_parent(99)]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags).build(&shared(&store, &[2]));
        assert_eq!(render(&nodes), vec!["0:Orphan"]);
    }

    #[test]
    fn parent_cycles_are_cut() {
        let store = RecordStore::from_records([
            Record::new(1, "A").with_parent(2),
            Record::new(2, "B").with_parent(1),
        ]);
        let tags = TagCatalog::default();
        // B is pulled in as A's anchor, and the walk back to A stops there.
        let nodes = TreeBuilder::new(&store, &tags).build(&shared(&store, &[1]));
        assert_eq!(render(&nodes), vec!["0:B", "1:A"]);
    }

    #[test]
    fn feature_dependencies_follow_the_feature() {
        let mut feature = Record::new(1, "Bundle");
        feature.feature = true;
        feature.dependencies = Some(vec!["com.acme.rocks".to_string(), "missing".to_string()]);
        let mut rocks = Record::new(2, "Rocks");
        rocks.safe_name = "com.acme.rocks".to_string();
        let mut unloaded = Record::new(3, "Unloaded Bundle");
        unloaded.feature = true;

        let store = RecordStore::from_records([
            feature,
            rocks,
            unloaded,
            Record::new(4, "Docs").with_parent(1),
        ]);
        let tags = TagCatalog::default();
        let nodes = TreeBuilder::new(&store, &tags).build(&shared(&store, &[1, 3]));
        assert_eq!(
            render(&nodes),
            vec!["0:Bundle", "1:Rocks", "1:Docs", "0:Unloaded Bundle"]
        );
    }

    #[test]
    fn tag_grouping_repeats_records_and_ends_untagged() {
        let store = RecordStore::from_records([
            Record::new(1, "Knight").with_tag("Medieval").with_tag("People"),
            Record::new(2, "Castle").with_tag("Medieval"),
            Record::new(3, "Tree"),
        ]);
        let tags = TagCatalog::new(vec![
            TagInfo {
                name: "People".to_string(),
                color: String::new(),
            },
            TagInfo {
                name: "Medieval".to_string(),
                color: String::new(),
            },
            TagInfo {
                name: "Unused".to_string(),
                color: String::new(),
            },
        ]);
        let nodes = TreeBuilder::new(&store, &tags)
            .grouping(GroupingMode::Tag)
            .build(&shared(&store, &[1, 2, 3]));
        assert_eq!(
            render(&nodes),
            vec![
                "0:[People]",
                "1:Knight",
                "0:[Medieval]",
                "1:Knight",
                "1:Castle",
                "0:[-untagged-]",
                "1:Tree",
            ]
        );
    }

    #[test]
    fn tagged_child_under_untagged_parent_joins_its_tag() {
        let store = RecordStore::from_records([
            Record::new(1, "Bundle"),
            Record::new(2, "Knight Armor").with_parent(1).with_tag("Medieval"),
        ]);
        let tags = TagCatalog::new(vec![TagInfo {
            name: "Medieval".to_string(),
            color: String::new(),
        }]);
        let nodes = TreeBuilder::new(&store, &tags)
            .grouping(GroupingMode::Tag)
            .build(&shared(&store, &[2]));
        assert_eq!(
            render(&nodes),
            vec!["0:[Medieval]", "1:Bundle", "2:Knight Armor"]
        );
    }
}
