use super::value_objects::{ConstraintType, OptimizationType, SolutionStatus, VariableType};
use std::fmt;

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        self.variable_type == VariableType::Integer
    }
}

/// Objective function to minimize or maximize, one coefficient per variable
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub coefficients: Vec<f64>,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, coefficients: Vec<f64>) -> Self {
        Self {
            optimization_type,
            coefficients,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    /// Objective value of an assignment
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }
}

/// Linear constraint over a sparse set of variables
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    /// `(variable index, coefficient)` pairs
    pub terms: Vec<(usize, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self {
            constraint_type,
            terms,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(i, c)| c * values.get(i).copied().unwrap_or(0.0))
            .sum()
    }

    /// Amount by which `values` violates this constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs(values);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => (lhs - self.bound).max(0.0),
            ConstraintType::GreaterThanOrEqual => (self.bound - lhs).max(0.0),
            ConstraintType::Equal => (lhs - self.bound).abs(),
        }
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub time_limit: Option<f64>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

/// Complete optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn add_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.objective.num_variables()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// Largest constraint or bound violation of an assignment
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let rows = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(var, &v)| {
                let below = (var.lower_bound - v).max(0.0);
                let above = var.upper_bound.map_or(0.0, |u| (v - u).max(0.0));
                below.max(above)
            })
            .fold(0.0, f64::max);
        rows.max(bounds)
    }
}

/// Writes the problem in CPLEX LP text form, used for failure artifacts.
impl fmt::Display for OptimizationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |i: usize| {
            self.variables
                .get(i)
                .map(|v| v.name.clone())
                .unwrap_or_else(|| format!("x{}", i))
        };

        writeln!(f, "\\ Problem: {}", self.name)?;
        match self.objective.optimization_type {
            OptimizationType::Maximize => writeln!(f, "Maximize")?,
            OptimizationType::Minimize => writeln!(f, "Minimize")?,
        }
        write!(f, " obj:")?;
        for (i, &c) in self.objective.coefficients.iter().enumerate() {
            if c != 0.0 {
                write!(f, " {:+} {}", c, name(i))?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Subject To")?;
        for (n, constraint) in self.constraints.iter().enumerate() {
            let label = if constraint.name.is_empty() {
                format!("c{}", n)
            } else {
                constraint.name.clone()
            };
            write!(f, " {}:", label)?;
            for &(i, c) in &constraint.terms {
                write!(f, " {:+} {}", c, name(i))?;
            }
            writeln!(
                f,
                " {} {}",
                constraint.constraint_type.symbol(),
                constraint.bound
            )?;
        }

        writeln!(f, "Bounds")?;
        for (i, var) in self.variables.iter().enumerate() {
            match var.upper_bound {
                Some(u) => writeln!(f, " {} <= {} <= {}", var.lower_bound, name(i), u)?,
                None => writeln!(f, " {} >= {}", name(i), var.lower_bound)?,
            }
        }

        let integers: Vec<String> = self
            .variables
            .iter()
            .filter(|v| v.is_integer())
            .map(|v| v.name.clone())
            .collect();
        if !integers.is_empty() {
            writeln!(f, "General")?;
            writeln!(f, " {}", integers.join(" "))?;
        }
        writeln!(f, "End")
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimal_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    /// A feasible incumbent returned when the time limit stopped the search
    pub fn time_limited(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::TimeLimit,
            optimal_value: Some(value),
            variable_values,
            message: "Time limit reached with a feasible incumbent".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Optimal, or stopped by the time limit while holding an incumbent
    pub fn is_usable(&self) -> bool {
        match self.status {
            SolutionStatus::Optimal => true,
            SolutionStatus::TimeLimit => !self.variable_values.is_empty(),
            _ => false,
        }
    }
}
