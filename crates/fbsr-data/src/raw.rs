//! Expansion of recipes into raw materials.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::game_data::RecipePrototype;

/// Key under which accumulated crafting time (seconds) is reported.
pub const RAW_TIME: &str = "time";

/// Expands recipes into raw ingredient totals.
///
/// An item is raw when no recipe of the same name exists. Results are per
/// single craft of the requested recipe.
#[derive(Debug)]
pub struct TotalRawCalculator<'a> {
    recipes: &'a HashMap<String, RecipePrototype>,
}

impl<'a> TotalRawCalculator<'a> {
    pub fn new(recipes: &'a HashMap<String, RecipePrototype>) -> Self {
        Self { recipes }
    }

    /// Raw totals for one craft of `recipe`, including crafting time.
    pub fn compute(&self, recipe: &RecipePrototype) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        let mut visiting = HashSet::new();
        self.expand(recipe, 1.0, &mut visiting, &mut totals);
        totals
    }

    fn expand(
        &self,
        recipe: &RecipePrototype,
        multiplier: f64,
        visiting: &mut HashSet<String>,
        totals: &mut BTreeMap<String, f64>,
    ) {
        visiting.insert(recipe.name.clone());
        *totals.entry(RAW_TIME.to_string()).or_insert(0.0) += recipe.energy * multiplier;

        for (name, amount) in &recipe.ingredients {
            let needed = amount * multiplier;
            let sub = self
                .recipes
                .get(name)
                .filter(|sub| !visiting.contains(&sub.name))
                .and_then(|sub| Some((sub, sub.result_amount(name).filter(|a| *a > 0.0)?)));
            match sub {
                Some((sub, yield_amount)) => {
                    self.expand(sub, needed / yield_amount, visiting, totals);
                }
                None => *totals.entry(name.clone()).or_insert(0.0) += needed,
            }
        }

        visiting.remove(&recipe.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str, ingredients: &[(&str, f64)], yields: f64, energy: f64) -> RecipePrototype {
        RecipePrototype {
            name: name.to_string(),
            ingredients: ingredients.iter().map(|(n, a)| (n.to_string(), *a)).collect(),
            results: vec![(name.to_string(), yields)],
            energy,
        }
    }

    fn book(list: Vec<RecipePrototype>) -> HashMap<String, RecipePrototype> {
        list.into_iter().map(|r| (r.name.clone(), r)).collect()
    }

    #[test]
    fn expands_nested_recipes() {
        let recipes = book(vec![
            recipe("iron-gear-wheel", &[("iron-plate", 2.0)], 1.0, 0.5),
            recipe("copper-cable", &[("copper-plate", 1.0)], 2.0, 0.5),
            recipe(
                "electronic-circuit",
                &[("iron-plate", 1.0), ("copper-cable", 3.0)],
                1.0,
                0.5,
            ),
            recipe(
                "inserter",
                &[("electronic-circuit", 1.0), ("iron-gear-wheel", 1.0), ("iron-plate", 1.0)],
                1.0,
                0.5,
            ),
        ]);
        let calc = TotalRawCalculator::new(&recipes);
        let raw = calc.compute(&recipes["inserter"]);

        assert_eq!(raw["iron-plate"], 4.0);
        assert_eq!(raw["copper-plate"], 1.5);
        // inserter + circuit + gear + 1.5 cable crafts
        assert_eq!(raw[RAW_TIME], 0.5 + 0.5 + 0.75 + 0.5);
        assert!(!raw.contains_key("iron-gear-wheel"));
    }

    #[test]
    fn cycles_terminate() {
        let recipes = book(vec![
            recipe("a", &[("b", 1.0)], 1.0, 1.0),
            recipe("b", &[("a", 1.0)], 1.0, 1.0),
        ]);
        let calc = TotalRawCalculator::new(&recipes);
        let raw = calc.compute(&recipes["a"]);
        assert_eq!(raw["a"], 1.0);
        assert_eq!(raw[RAW_TIME], 2.0);
    }
}
