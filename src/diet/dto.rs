use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dietary restriction the user analyses labels against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietType {
    #[serde(rename = "Vegan")]
    Vegan,
    #[serde(rename = "Lacto vegetarian")]
    LactoVegetarian,
    #[serde(rename = "Ovo vegetarian")]
    OvoVegetarian,
    #[serde(rename = "Lacto-ovo vegetarian")]
    LactoOvoVegetarian,
    #[serde(rename = "Pesco-vegetarian")]
    PescoVegetarian,
    #[serde(rename = "Pollo-vegetarian")]
    PolloVegetarian,
}

impl DietType {
    pub const ALL: [DietType; 6] = [
        DietType::Vegan,
        DietType::LactoVegetarian,
        DietType::OvoVegetarian,
        DietType::LactoOvoVegetarian,
        DietType::PescoVegetarian,
        DietType::PolloVegetarian,
    ];

    /// Stored and wire value (`vegType`, `x-user-type`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Vegan => "Vegan",
            DietType::LactoVegetarian => "Lacto vegetarian",
            DietType::OvoVegetarian => "Ovo vegetarian",
            DietType::LactoOvoVegetarian => "Lacto-ovo vegetarian",
            DietType::PescoVegetarian => "Pesco-vegetarian",
            DietType::PolloVegetarian => "Pollo-vegetarian",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DietType::Vegan => "Vegan",
            DietType::LactoVegetarian => "Lacto Vegetarian",
            DietType::OvoVegetarian => "Ovo Vegetarian",
            DietType::LactoOvoVegetarian => "Lacto Ovo Vegetarian",
            DietType::PescoVegetarian => "Pesco Vegetarian",
            DietType::PolloVegetarian => "Pollo Vegetarian",
        }
    }

    /// Food groups this diet allows, in icon order.
    pub fn allowed_food_groups(&self) -> Vec<FoodGroup> {
        use DietType::*;
        let mut groups = vec![FoodGroup::Vegetable];
        if matches!(
            self,
            LactoVegetarian | LactoOvoVegetarian | PescoVegetarian | PolloVegetarian
        ) {
            groups.push(FoodGroup::Dairy);
        }
        if matches!(
            self,
            OvoVegetarian | LactoOvoVegetarian | PescoVegetarian | PolloVegetarian
        ) {
            groups.push(FoodGroup::Egg);
        }
        if matches!(self, PescoVegetarian | PolloVegetarian) {
            groups.push(FoodGroup::Fish);
        }
        if matches!(self, PolloVegetarian) {
            groups.push(FoodGroup::Chicken);
        }
        groups
    }

    pub fn allows(&self, group: FoodGroup) -> bool {
        self.allowed_food_groups().contains(&group)
    }
}

impl fmt::Display for DietType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown diet type: {0}")]
pub struct UnknownDietType(pub String);

impl FromStr for DietType {
    type Err = UnknownDietType;

    /// Accepts the stored value, the display name, or either with `-`, `_`
    /// and case differences (`lacto-ovo-vegetarian`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        DietType::ALL
            .into_iter()
            .find(|d| normalize(d.as_str()) == wanted || normalize(d.display_name()) == wanted)
            .ok_or_else(|| UnknownDietType(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodGroup {
    Vegetable,
    Dairy,
    Egg,
    Fish,
    Chicken,
    Meat,
}

impl FoodGroup {
    pub const ALL: [FoodGroup; 6] = [
        FoodGroup::Vegetable,
        FoodGroup::Dairy,
        FoodGroup::Egg,
        FoodGroup::Fish,
        FoodGroup::Chicken,
        FoodGroup::Meat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodGroup::Vegetable => "vegetable",
            FoodGroup::Dairy => "dairy",
            FoodGroup::Egg => "egg",
            FoodGroup::Fish => "fish",
            FoodGroup::Chicken => "chicken",
            FoodGroup::Meat => "meat",
        }
    }

    pub fn icon_path(&self, active: bool) -> String {
        // meat is never shown in colour
        if active && *self != FoodGroup::Meat {
            format!("/static/images/icons/{}.png", self.as_str())
        } else {
            format!("/static/images/icons/{}_gray.png", self.as_str())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodGroupIcon {
    pub group: FoodGroup,
    pub active: bool,
    pub icon: String,
}

/// Icon state for every food group under the given diet.
pub fn food_group_icons(diet: DietType) -> Vec<FoodGroupIcon> {
    FoodGroup::ALL
        .into_iter()
        .map(|group| {
            let active = diet.allows(group);
            FoodGroupIcon {
                group,
                active,
                icon: group.icon_path(active),
            }
        })
        .collect()
}
