//! Cheapest route search over the known direct routes.
//!
//! Costs are relaxed edge by edge until a pass changes nothing, which gives the cheapest
//! itinerary. Further alternatives come from spurring off the itineraries found so far (Yen's
//! k-shortest simple paths), every spur search being the same relaxation with some airports
//! and edges taken out.

use std::collections::{HashMap, HashSet};

use route_finder_shared::routes::{round2, CheapestRoute, Edge, Segment};

/// Number of itineraries returned by [`find_cheapest_routes`]
pub const MAX_ROUTES: usize = 3;

struct Leg {
    from: usize,
    to: usize,
    price: f64,
}

/// Cheapest known way of reaching a node from the search source.
///
/// `legs` indexes into the input edges, `path` into the node codes, and
/// `path.len() == legs.len() + 1` whenever the node is reachable.
#[derive(Clone, Debug)]
struct CostEntry {
    total_cost: f64,
    legs: Vec<usize>,
    path: Vec<usize>,
}

impl CostEntry {
    fn unreached() -> Self {
        CostEntry {
            total_cost: f64::INFINITY,
            legs: Vec::new(),
            path: Vec::new(),
        }
    }

    fn source(node: usize) -> Self {
        CostEntry {
            total_cost: 0.0,
            legs: Vec::new(),
            path: vec![node],
        }
    }

    fn is_reached(&self) -> bool {
        !self.path.is_empty()
    }
}

struct RouteGraph<'a> {
    edges: &'a [Edge],
    codes: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    legs: Vec<Leg>,
}

impl<'a> RouteGraph<'a> {
    fn new(edges: &'a [Edge]) -> Self {
        let mut codes = Vec::new();
        let mut index = HashMap::new();
        let mut intern = |code: &'a str| {
            *index.entry(code).or_insert_with(|| {
                codes.push(code);
                codes.len() - 1
            })
        };

        let legs = edges
            .iter()
            .map(|edge| Leg {
                from: intern(edge.origin.as_str()),
                to: intern(edge.destination.as_str()),
                price: round2(edge.price),
            })
            .collect();

        RouteGraph {
            edges,
            codes,
            index,
            legs,
        }
    }

    fn node(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    /// Relax every allowed edge, in input order, until a pass makes no update. Passes are
    /// capped at the number of edges. A cost only moves on a strictly cheaper candidate, so
    /// the first edge reaching a cost keeps it.
    fn relax(
        &self,
        source: usize,
        removed_nodes: &HashSet<usize>,
        removed_legs: &HashSet<usize>,
    ) -> Vec<CostEntry> {
        let mut table = vec![CostEntry::unreached(); self.codes.len()];
        table[source] = CostEntry::source(source);

        for _ in 0..self.legs.len() {
            let mut updated = false;

            for (leg_idx, leg) in self.legs.iter().enumerate() {
                if removed_legs.contains(&leg_idx)
                    || removed_nodes.contains(&leg.from)
                    || removed_nodes.contains(&leg.to)
                {
                    continue;
                }

                let from = &table[leg.from];
                // Never revisit an airport, keeps every recorded path simple
                if !from.is_reached() || from.path.contains(&leg.to) {
                    continue;
                }

                let candidate = round2(from.total_cost + leg.price);
                if candidate < table[leg.to].total_cost {
                    let mut entry = from.clone();
                    entry.total_cost = candidate;
                    entry.legs.push(leg_idx);
                    entry.path.push(leg.to);
                    table[leg.to] = entry;
                    updated = true;
                }
            }

            if !updated {
                break;
            }
        }

        table
    }

    fn cost_of(&self, legs: &[usize]) -> f64 {
        legs.iter()
            .fold(0.0, |total, &leg_idx| round2(total + self.legs[leg_idx].price))
    }

    fn to_cheapest_route(&self, entry: CostEntry) -> CheapestRoute {
        CheapestRoute {
            route: entry
                .path
                .iter()
                .map(|&node| self.codes[node].to_string())
                .collect(),
            total_cost: entry.total_cost,
            segment_costs: entry
                .legs
                .iter()
                .map(|&leg_idx| Segment {
                    from: self.edges[leg_idx].origin.clone(),
                    to: self.edges[leg_idx].destination.clone(),
                    price: self.legs[leg_idx].price,
                })
                .collect(),
        }
    }
}

/// Index of the cheapest candidate, the earliest one on ties
fn cheapest_candidate(candidates: &[CostEntry]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        match best {
            Some(b) if candidates[b].total_cost <= candidate.total_cost => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Find the (up to) [`MAX_ROUTES`] cheapest simple itineraries from `origin` to `destination`.
pub fn find_cheapest_routes(edges: &[Edge], origin: &str, destination: &str) -> Vec<CheapestRoute> {
    k_cheapest_routes(edges, origin, destination, MAX_ROUTES)
}

/// Find the (up to) `k` cheapest simple itineraries from `origin` to `destination`, sorted by
/// total cost. Parallel edges between the same airports count as distinct itineraries.
pub fn k_cheapest_routes(
    edges: &[Edge],
    origin: &str,
    destination: &str,
    k: usize,
) -> Vec<CheapestRoute> {
    if k == 0 {
        return Vec::new();
    }

    let graph = RouteGraph::new(edges);
    let (Some(source), Some(target)) = (graph.node(origin), graph.node(destination)) else {
        return Vec::new();
    };

    let mut table = graph.relax(source, &HashSet::new(), &HashSet::new());
    let cheapest = std::mem::replace(&mut table[target], CostEntry::unreached());
    if !cheapest.is_reached() {
        return Vec::new();
    }

    let mut found = vec![cheapest];
    let mut candidates: Vec<CostEntry> = Vec::new();

    while found.len() < k {
        let last = found[found.len() - 1].clone();

        for spur_idx in 0..last.legs.len() {
            let spur_node = last.path[spur_idx];
            let root_legs = &last.legs[..spur_idx];

            // Itineraries sharing this root must leave the spur airport some other way
            let removed_legs: HashSet<usize> = found
                .iter()
                .filter(|it| it.legs.len() > spur_idx && it.legs[..spur_idx] == *root_legs)
                .map(|it| it.legs[spur_idx])
                .collect();
            let removed_nodes: HashSet<usize> = last.path[..spur_idx].iter().copied().collect();

            let mut spur_table = graph.relax(spur_node, &removed_nodes, &removed_legs);
            let spur = std::mem::replace(&mut spur_table[target], CostEntry::unreached());
            if !spur.is_reached() {
                continue;
            }

            let mut legs = root_legs.to_vec();
            legs.extend_from_slice(&spur.legs);
            let mut path = last.path[..spur_idx].to_vec();
            path.extend_from_slice(&spur.path);

            let known = found
                .iter()
                .chain(candidates.iter())
                .any(|it| it.legs == legs);
            if !known {
                candidates.push(CostEntry {
                    total_cost: graph.cost_of(&legs),
                    legs,
                    path,
                });
            }
        }

        let Some(best) = cheapest_candidate(&candidates) else {
            break;
        };
        found.push(candidates.remove(best));
    }

    found.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost));
    found.truncate(k);
    found
        .into_iter()
        .map(|entry| graph.to_cheapest_route(entry))
        .collect()
}
