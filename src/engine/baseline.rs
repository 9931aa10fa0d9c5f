use crate::models::{ActionKind, Category};

/// Reference carbon cost (kg CO2) of each disposal path for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Producing a replacement from scratch.
    pub new: f64,
    pub repair: f64,
    /// Reuse and donation share this cost.
    pub reuse: f64,
    pub resale: f64,
}

const ELECTRONICS: Baseline = Baseline {
    new: 150.0,
    repair: 12.0,
    reuse: 8.0,
    resale: 6.0,
};

const FURNITURE: Baseline = Baseline {
    new: 250.0,
    repair: 20.0,
    reuse: 15.0,
    resale: 10.0,
};

const CLOTHING: Baseline = Baseline {
    new: 50.0,
    repair: 3.0,
    reuse: 2.0,
    resale: 1.5,
};

const APPLIANCES: Baseline = Baseline {
    new: 200.0,
    repair: 18.0,
    reuse: 12.0,
    resale: 8.0,
};

impl Baseline {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Electronics => ELECTRONICS,
            Category::Furniture => FURNITURE,
            Category::Clothing => CLOTHING,
            Category::Appliances => APPLIANCES,
        }
    }

    /// Looks a category up by name. Unknown names get the electronics row.
    pub fn lookup(category: &str) -> Self {
        category
            .parse::<Category>()
            .map(Self::for_category)
            .unwrap_or(ELECTRONICS)
    }

    /// Cost of the path an action takes. Donation follows the reuse path.
    pub fn path_cost(&self, action: ActionKind) -> f64 {
        match action {
            ActionKind::Repair => self.repair,
            ActionKind::Reuse | ActionKind::Donation => self.reuse,
            ActionKind::Resale => self.resale,
        }
    }

    pub fn carbon_saved(&self, action: ActionKind) -> f64 {
        self.new - self.path_cost(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_uses_electronics() {
        assert_eq!(Baseline::lookup("Toys"), Baseline::for_category(Category::Electronics));
        assert_eq!(Baseline::lookup(""), ELECTRONICS);
        assert_eq!(Baseline::lookup("clothing"), CLOTHING);
    }

    #[test]
    fn test_carbon_saved_is_new_minus_path() {
        let b = Baseline::for_category(Category::Electronics);
        assert_eq!(b.carbon_saved(ActionKind::Resale), 144.0);
        assert_eq!(b.carbon_saved(ActionKind::Repair), 138.0);
        assert_eq!(b.carbon_saved(ActionKind::Reuse), 142.0);
        assert_eq!(b.carbon_saved(ActionKind::Donation), 142.0);

        let c = Baseline::for_category(Category::Clothing);
        assert_eq!(c.carbon_saved(ActionKind::Resale), 48.5);
    }
}
