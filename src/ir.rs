use serde::Serialize;

/// Index of an operator inside its [`PlanTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OperatorId(pub usize);

impl OperatorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One relational operator (`RelOp`) of an execution plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOperator {
    pub id: OperatorId,
    pub physical_op: String,
    pub logical_op: String,
    pub object_name: String,
    pub estimate_rows: f64,
    pub estimate_cpu: f64,
    pub estimate_io: f64,
    pub estimate_rebinds: f64,
    pub estimate_rewinds: f64,
    pub estimate_executions: f64,
    pub avg_row_size: f64,
    pub total_subtree_cost: f64,
    /// Subtree cost as a fraction of the root operator's subtree cost.
    pub rel_op_cost: f64,
    pub parallel: bool,
    pub node_id: i64,
    pub warnings: Vec<String>,
    pub children: Vec<OperatorId>,
    pub parent: Option<OperatorId>,
    pub depth: usize,
}

impl PlanOperator {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Text for the secondary node line: the object when known, otherwise
    /// the logical operation.
    pub fn secondary_label(&self) -> &str {
        if self.object_name.is_empty() {
            &self.logical_op
        } else {
            &self.object_name
        }
    }
}

/// Parsed execution plan. Operators are stored in pre-order, so the root is
/// always at index 0 and every parent precedes its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanTree {
    operators: Vec<PlanOperator>,
}

impl PlanTree {
    pub(crate) fn from_operators(operators: Vec<PlanOperator>) -> Self {
        debug_assert!(!operators.is_empty());
        Self { operators }
    }

    pub fn root_id(&self) -> OperatorId {
        OperatorId(0)
    }

    pub fn root(&self) -> &PlanOperator {
        &self.operators[0]
    }

    pub fn get(&self, id: OperatorId) -> Option<&PlanOperator> {
        self.operators.get(id.0)
    }

    pub fn children(&self, id: OperatorId) -> impl Iterator<Item = &PlanOperator> {
        self.operators[id.0]
            .children
            .iter()
            .map(|child| &self.operators[child.0])
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanOperator> {
        self.operators.iter()
    }

    /// Number of operator levels, a single-operator plan has depth 1.
    pub fn depth(&self) -> usize {
        self.operators
            .iter()
            .map(|op| op.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Parent/child pairs in pre-order, the order edges are drawn in.
    pub fn edges(&self) -> Vec<(OperatorId, OperatorId)> {
        self.operators
            .iter()
            .flat_map(|op| op.children.iter().map(move |child| (op.id, *child)))
            .collect()
    }
}

impl std::ops::Index<OperatorId> for PlanTree {
    type Output = PlanOperator;

    fn index(&self, id: OperatorId) -> &PlanOperator {
        &self.operators[id.0]
    }
}
