//! The treasury-account filter tree: toptier agency → federal account →
//! treasury account. Each tier is queried on its own, restricted to entities
//! with linked award financial activity, then combined by ancestry.

use fedspend_domain::cfo;
use fedspend_storage::{
	models::{FederalAccountRow, ToptierAgencyRow, TreasuryAccountRow},
	queries,
};

use crate::{ServiceError, ServiceResult, SpendService};

/// How many tiers below the addressed one to expand. `All` expands to the
/// bottom of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLayers {
	None,
	One,
	Two,
	All,
}
impl ChildLayers {
	pub fn parse(raw: i64) -> Option<Self> {
		match raw {
			0 => Some(Self::None),
			1 => Some(Self::One),
			2 => Some(Self::Two),
			-1 => Some(Self::All),
			_ => None,
		}
	}

	fn depth(self) -> u8 {
		match self {
			Self::None => 0,
			Self::One => 1,
			Self::Two | Self::All => 2,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TreeNode {
	pub id: String,
	pub ancestors: Vec<String>,
	pub description: String,
	pub count: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub children: Option<Vec<TreeNode>>,
}

/// Tree search addressed by 0-2 ancestor ids: none for the agency tier, the
/// agency code for its federal accounts, agency plus federal-account code for
/// its treasury accounts.
///
/// Tiers are queried from the deepest requested one upward. The filter
/// applies directly at the deepest tier; each tier above keeps rows that
/// either match it themselves or own a kept deeper row, so a match keeps its
/// whole ancestry path in the tree.
pub async fn filter_tree(
	svc: &SpendService,
	path: &[String],
	child_layers: ChildLayers,
	filter: Option<&str>,
) -> ServiceResult<Vec<TreeNode>> {
	match path {
		[] => {
			let depth = child_layers.depth();
			let tier2 = if depth >= 2 {
				tier2_nodes(svc, None, None, filter).await?
			} else {
				Vec::new()
			};
			let tier1 = if depth >= 1 {
				tier1_nodes(svc, None, filter, &parent_ids(&tier2)).await?
			} else {
				Vec::new()
			};
			let tier0 = toptier_nodes(svc, filter, &parent_ids(&tier1)).await?;
			let tier1 = if depth >= 2 { combine_nodes(tier1, tier2) } else { tier1 };

			Ok(if depth >= 1 { combine_nodes(tier0, tier1) } else { tier0 })
		},
		[agency] => {
			let depth = child_layers.depth().min(1);
			let tier2 = if depth >= 1 {
				tier2_nodes(svc, Some(agency.as_str()), None, filter).await?
			} else {
				Vec::new()
			};
			let tier1 = tier1_nodes(svc, Some(agency.as_str()), filter, &parent_ids(&tier2)).await?;

			Ok(if depth >= 1 { combine_nodes(tier1, tier2) } else { tier1 })
		},
		[agency, federal_account] =>
			tier2_nodes(svc, Some(agency.as_str()), Some(federal_account.as_str()), filter).await,
		_ => Err(ServiceError::Precondition {
			message: format!("Tree search path has {} segments, at most 2 allowed.", path.len()),
		}),
	}
}

/// Agency nodes in CFO presentation order rather than code order.
async fn toptier_nodes(
	svc: &SpendService,
	filter: Option<&str>,
	include_codes: &[String],
) -> ServiceResult<Vec<TreeNode>> {
	let mut rows = queries::toptier_agencies(&svc.db, filter, include_codes).await?;

	cfo::presentation_sort(
		&mut rows,
		|row: &ToptierAgencyRow| &row.toptier_code,
		|row: &ToptierAgencyRow| &row.name,
	);

	let mut nodes = Vec::with_capacity(rows.len());

	for row in rows {
		let count = queries::count_treasury_accounts_for_agency(&svc.db, &row.toptier_code).await?;

		nodes.push(TreeNode {
			id: row.toptier_code,
			ancestors: Vec::new(),
			description: describe_agency(&row.name, row.abbreviation.as_deref()),
			count,
			children: None,
		});
	}

	Ok(nodes)
}

async fn tier1_nodes(
	svc: &SpendService,
	agency: Option<&str>,
	filter: Option<&str>,
	include_codes: &[String],
) -> ServiceResult<Vec<TreeNode>> {
	let rows = queries::federal_accounts(&svc.db, agency, filter, include_codes).await?;
	let mut nodes = Vec::with_capacity(rows.len());

	for row in rows {
		let count =
			queries::count_treasury_accounts_for_federal_account(&svc.db, &row.federal_account_code)
				.await?;

		nodes.push(federal_account_node(row, count));
	}

	Ok(nodes)
}

async fn tier2_nodes(
	svc: &SpendService,
	agency: Option<&str>,
	federal_account: Option<&str>,
	filter: Option<&str>,
) -> ServiceResult<Vec<TreeNode>> {
	let rows = queries::treasury_accounts(&svc.db, agency, federal_account, filter).await?;

	Ok(rows.into_iter().map(treasury_account_node).collect())
}

/// Ids the next tier up must keep: each child's immediate parent, deduplicated.
fn parent_ids(children: &[TreeNode]) -> Vec<String> {
	let mut ids = children
		.iter()
		.filter_map(|child| child.ancestors.last().cloned())
		.collect::<Vec<_>>();

	ids.sort_unstable();
	ids.dedup();

	ids
}

fn describe_agency(name: &str, abbreviation: Option<&str>) -> String {
	match abbreviation.filter(|abbreviation| !abbreviation.is_empty()) {
		Some(abbreviation) => format!("{name} ({abbreviation})"),
		None => name.to_string(),
	}
}

fn federal_account_node(row: FederalAccountRow, count: i64) -> TreeNode {
	TreeNode {
		id: row.federal_account_code,
		ancestors: vec![row.agency_identifier],
		description: row.account_title,
		count,
		children: None,
	}
}

fn treasury_account_node(row: TreasuryAccountRow) -> TreeNode {
	TreeNode {
		id: row.tas_rendering_label,
		ancestors: vec![row.agency_id, row.federal_account_code],
		// A treasury account node represents itself.
		count: 1,
		description: row.account_title.unwrap_or_default(),
		children: Some(Vec::new()),
	}
}

/// Attaches each child under the parent whose id is the last element of the
/// child's ancestry. Unattached children are dropped; attached children end
/// up sorted by id.
fn combine_nodes(mut parents: Vec<TreeNode>, children: Vec<TreeNode>) -> Vec<TreeNode> {
	for parent in &mut parents {
		parent.children.get_or_insert_with(Vec::new);
	}

	for child in children {
		let Some(parent) =
			parents.iter_mut().find(|parent| child.ancestors.last() == Some(&parent.id))
		else {
			continue;
		};

		parent.children.get_or_insert_with(Vec::new).push(child);
	}

	for parent in &mut parents {
		if let Some(children) = parent.children.as_mut() {
			children.sort_by(|a, b| a.id.cmp(&b.id));
		}
	}

	parents
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str, ancestors: &[&str]) -> TreeNode {
		TreeNode {
			id: id.to_string(),
			ancestors: ancestors.iter().map(|ancestor| ancestor.to_string()).collect(),
			description: String::new(),
			count: 0,
			children: None,
		}
	}

	#[test]
	fn children_attach_by_last_ancestor_only() {
		let parents = vec![node("097", &[]), node("013", &[])];
		let children = vec![
			node("097-0100", &["097"]),
			node("013-0500", &["013"]),
			node("999-0001", &["999"]),
		];
		let combined = combine_nodes(parents, children);

		assert_eq!(combined[0].children.as_deref().expect("children")[0].id, "097-0100");
		assert_eq!(combined[1].children.as_deref().expect("children")[0].id, "013-0500");
		// The orphan is dropped, not attached elsewhere.
		assert_eq!(
			combined.iter().map(|parent| parent.children.as_deref().expect("children").len()).sum::<usize>(),
			2,
		);
	}

	#[test]
	fn attached_children_are_sorted_by_id() {
		let parents = vec![node("097", &[])];
		let children = vec![
			node("097-0300", &["097"]),
			node("097-0100", &["097"]),
			node("097-0200", &["097"]),
		];
		let combined = combine_nodes(parents, children);
		let ids = combined[0]
			.children
			.as_deref()
			.expect("children")
			.iter()
			.map(|child| child.id.as_str())
			.collect::<Vec<_>>();

		assert_eq!(ids, ["097-0100", "097-0200", "097-0300"]);
	}

	#[test]
	fn combining_gives_childless_parents_an_empty_list() {
		let combined = combine_nodes(vec![node("097", &[])], Vec::new());

		assert_eq!(combined[0].children.as_deref(), Some(&[][..]));
	}

	#[test]
	fn parent_ids_collect_each_childs_immediate_ancestor() {
		let children = vec![
			node("097-X-0100-000", &["097", "097-0100"]),
			node("097-X-0100-001", &["097", "097-0100"]),
			node("013-X-0500-000", &["013", "013-0500"]),
		];

		assert_eq!(parent_ids(&children), ["013-0500", "097-0100"]);
		assert!(parent_ids(&[]).is_empty());
	}

	#[test]
	fn treasury_nodes_count_themselves() {
		let node = treasury_account_node(TreasuryAccountRow {
			tas_rendering_label: "097-X-0100-000".to_string(),
			account_title: Some("Operation and Maintenance".to_string()),
			agency_id: "097".to_string(),
			main_account_code: "0100".to_string(),
			federal_account_code: "097-0100".to_string(),
		});

		assert_eq!(node.count, 1);
		assert_eq!(node.ancestors, ["097", "097-0100"]);
		assert_eq!(node.children.as_deref(), Some(&[][..]));
	}

	#[test]
	fn agency_description_includes_the_abbreviation_when_present() {
		assert_eq!(describe_agency("Department of Defense", Some("DOD")), "Department of Defense (DOD)");
		assert_eq!(describe_agency("Department of Defense", Some("")), "Department of Defense");
		assert_eq!(describe_agency("Department of Defense", None), "Department of Defense");
	}

	#[test]
	fn child_layer_parsing_rejects_unknown_depths() {
		assert_eq!(ChildLayers::parse(-1), Some(ChildLayers::All));
		assert_eq!(ChildLayers::parse(0), Some(ChildLayers::None));
		assert_eq!(ChildLayers::parse(2), Some(ChildLayers::Two));
		assert_eq!(ChildLayers::parse(3), None);
	}
}
