//! Field binding: the static form schema and input coercion.
//!
//! Each section of the config is shown as a group of labelled controls.
//! A control turns raw input into a [`Value`] and addresses its setting by a
//! key path relative to its section.

use redux_document::{KeyPath, Number, Value};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FieldError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),
    #[error("Unknown field '{field}' in section '{section}'")]
    UnknownField { section: String, field: String },
    #[error("'{field}' expects {expected}")]
    WrongInput {
        field: &'static str,
        expected: &'static str,
    },
    #[error("'{0}' must be a finite number")]
    NotFinite(&'static str),
    #[error("'{0}' cannot be negative")]
    Negative(&'static str),
    #[error("'{0}' requires a value")]
    Required(&'static str),
    #[error("Cannot read '{raw}' as {expected}")]
    Unparseable { raw: String, expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Toggle,
    Number,
}

/// Display hints for numeric inputs. Only non-negativity is enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Dot-separated path relative to the section
    pub key: &'static str,
    pub label: &'static str,
    pub widget: WidgetKind,
    pub tooltip: &'static str,
    pub bounds: Option<Bounds>,
    /// An empty numeric input stores `null`
    pub nullable: bool,
}

/// Raw control state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldInput {
    Toggle(bool),
    /// `None` for an empty input box
    Number(Option<f64>),
}

impl FieldInput {
    /// Read command-line style text for a control of kind `widget`.
    /// `""` and `null` mean an empty numeric input.
    pub fn parse(widget: WidgetKind, raw: &str) -> Result<Self, FieldError> {
        let raw = raw.trim();
        match widget {
            WidgetKind::Toggle => match raw {
                "true" | "on" | "1" => Ok(FieldInput::Toggle(true)),
                "false" | "off" | "0" => Ok(FieldInput::Toggle(false)),
                _ => Err(FieldError::Unparseable {
                    raw: raw.to_string(),
                    expected: "a boolean",
                }),
            },
            WidgetKind::Number => match raw {
                "" | "null" => Ok(FieldInput::Number(None)),
                _ => raw
                    .parse::<f64>()
                    .map(|n| FieldInput::Number(Some(n)))
                    .map_err(|_| FieldError::Unparseable {
                        raw: raw.to_string(),
                        expected: "a number",
                    }),
            },
        }
    }
}

const fn toggle(key: &'static str, label: &'static str, tooltip: &'static str) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        widget: WidgetKind::Toggle,
        tooltip,
        bounds: None,
        nullable: false,
    }
}

const fn number(
    key: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
    tooltip: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        widget: WidgetKind::Number,
        tooltip,
        bounds: Some(Bounds { min, max, step }),
        nullable: false,
    }
}

impl FieldDescriptor {
    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Path relative to the section.
    pub fn relative_path(&self) -> KeyPath {
        KeyPath::from(self.key)
    }

    /// Convert control input into the value to store.
    pub fn coerce(&self, input: FieldInput) -> Result<Value, FieldError> {
        match (self.widget, input) {
            (WidgetKind::Toggle, FieldInput::Toggle(on)) => Ok(Value::Bool(on)),
            (WidgetKind::Number, FieldInput::Number(None)) if self.nullable => Ok(Value::Null),
            (WidgetKind::Number, FieldInput::Number(None)) => Err(FieldError::Required(self.key)),
            (WidgetKind::Number, FieldInput::Number(Some(n))) => {
                if !n.is_finite() {
                    Err(FieldError::NotFinite(self.key))
                } else if n < 0.0 {
                    Err(FieldError::Negative(self.key))
                } else {
                    Ok(Value::Number(Number::from_f64(n)))
                }
            }
            (WidgetKind::Toggle, _) => Err(FieldError::WrongInput {
                field: self.key,
                expected: "a toggle",
            }),
            (WidgetKind::Number, _) => Err(FieldError::WrongInput {
                field: self.key,
                expected: "a number",
            }),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct SectionSchema {
    /// Top-level key in the document
    pub key: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl SectionSchema {
    pub fn path(&self) -> KeyPath {
        KeyPath::from(self.key)
    }

    pub fn field(&self, key: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Absolute document path of one of this section's fields.
    pub fn field_path(&self, field: &FieldDescriptor) -> KeyPath {
        let mut path = self.path();
        for segment in field.relative_path().segments() {
            path = path.child(segment);
        }
        path
    }
}

/// All sections, in sidebar order.
pub fn sections() -> &'static [SectionSchema] {
    SECTIONS
}

pub fn section(key: &str) -> Option<&'static SectionSchema> {
    SECTIONS.iter().find(|s| s.key == key)
}

/// Resolve a section field and coerce its input: the absolute path and value
/// to hand to the session.
pub fn bind(section_key: &str, field_key: &str, input: FieldInput) -> Result<(KeyPath, Value), FieldError> {
    let (schema, field) = lookup(section_key, field_key)?;
    let value = field.coerce(input)?;
    Ok((schema.field_path(field), value))
}

pub fn lookup(
    section_key: &str,
    field_key: &str,
) -> Result<(&'static SectionSchema, &'static FieldDescriptor), FieldError> {
    let schema = section(section_key)
        .ok_or_else(|| FieldError::UnknownSection(section_key.to_string()))?;
    let field = schema.field(field_key).ok_or_else(|| FieldError::UnknownField {
        section: section_key.to_string(),
        field: field_key.to_string(),
    })?;
    Ok((schema, field))
}

/// Find the schema entry for an absolute path such as
/// `hideoutOptions.fasterBitcoinFarming.enabled`.
pub fn find_by_path(path: &KeyPath) -> Option<(&'static SectionSchema, &'static FieldDescriptor)> {
    let (first, rest) = path.segments().split_first()?;
    let schema = section(first)?;
    let field = schema.field(&rest.join("."))?;
    Some((schema, field))
}

static SECTIONS: &[SectionSchema] = &[
    SectionSchema {
        key: "hideoutOptions",
        label: "Hideout Options",
        fields: HIDEOUT_OPTIONS,
    },
    SectionSchema {
        key: "stashOptions",
        label: "Stash Options",
        fields: STASH_OPTIONS,
    },
    SectionSchema {
        key: "traderChanges",
        label: "Trader Changes",
        fields: TRADER_CHANGES,
    },
    SectionSchema {
        key: "craftingChanges",
        label: "Crafting Changes",
        fields: CRAFTING_CHANGES,
    },
    SectionSchema {
        key: "insuranceChanges",
        label: "Insurance Changes",
        fields: INSURANCE_CHANGES,
    },
    SectionSchema {
        key: "secureContainersOptions",
        label: "Secure Containers",
        fields: SECURE_CONTAINERS_OPTIONS,
    },
    SectionSchema {
        key: "economyOptions",
        label: "Economy Options",
        fields: ECONOMY_OPTIONS,
    },
    SectionSchema {
        key: "otherTweaks",
        label: "Other Tweaks",
        fields: OTHER_TWEAKS,
    },
];

const HIDEOUT_OPTIONS: &[FieldDescriptor] = &[
    toggle("fasterBitcoinFarming.enabled", "Faster Bitcoin Farming", "Enable/disable faster bitcoin farming"),
    number("fasterBitcoinFarming.bitcoinPrice", "Bitcoin Price", 0.0, 10_000_000.0, 1000.0, "Price of bitcoin in the handbook. Default is 100000. Leave empty to not change the price.").nullable(),
    number("fasterBitcoinFarming.baseBitcoinTimeMultiplier", "Bitcoin Time Multiplier", 1.0, 1000.0, 1.0, "Base bitcoin production time multiplier (higher = faster)"),
    number("fasterBitcoinFarming.gpuEfficiency", "GPU Efficiency", 1.0, 100.0, 1.0, "GPU efficiency for bitcoin farm"),
    toggle("fasterCraftingTime.enabled", "Faster Crafting Time", "Faster crafting for all crafts except bitcoin, moonshine and purified water"),
    number("fasterCraftingTime.baseCraftingTimeMultiplier", "Crafting Time Multiplier", 1.0, 1000.0, 1.0, "Base crafting time multiplier for most crafts (higher = faster)"),
    toggle("fasterCraftingTime.hideoutSkillExpFix.enabled", "Hideout Skill Exp Fix", "Enable/disable hideout skill exp fix for crafting"),
    number("fasterCraftingTime.hideoutSkillExpFix.hideoutSkillExpMultiplier", "Hideout Skill Exp Multiplier", 1.0, 100.0, 1.0, "Multiplier for hideout skill exp gain from crafting"),
    toggle("fasterCraftingTime.fasterMoonshineProduction.enabled", "Faster Moonshine Production", "Enable/disable faster moonshine production"),
    number("fasterCraftingTime.fasterMoonshineProduction.baseCraftingTimeMultiplier", "Moonshine Time Multiplier", 1.0, 100.0, 1.0, "Base crafting time multiplier for moonshine (higher = faster)"),
    toggle("fasterCraftingTime.fasterPurifiedWaterProduction.enabled", "Faster Purified Water", "Enable/disable faster purified water production"),
    number("fasterCraftingTime.fasterPurifiedWaterProduction.baseCraftingTimeMultiplier", "Purified Water Time Multiplier", 1.0, 100.0, 1.0, "Base crafting time multiplier for purified water (higher = faster)"),
    toggle("fasterCraftingTime.fasterCultistCircle.enabled", "Faster Cultist Circle", "Enable/disable faster cultist circle production"),
    number("fasterCraftingTime.fasterCultistCircle.baseCraftingTimeMultiplier", "Cultist Circle Time Multiplier", 1.0, 100.0, 1.0, "Base crafting time multiplier for cultist circle (higher = faster)"),
    toggle("hideoutContainers.enabled", "Hideout Containers", "Enable/disable hideout containers tweaks"),
    toggle("hideoutContainers.biggerHideoutContainers", "Bigger Hideout Containers", "Medicine case 7x7 -> 10x10, Holodilnick 8x8 -> 10x10, Magazine case 7x7 -> 7x10, Item case 8x8 -> 10x10, Weapon case 5x10 -> 6x10, Keytool -> 5x5"),
    toggle("hideoutContainers.siccCaseBuff", "SICC Case Buff", "SICC case becomes a direct upgrade to Docs and can hold keytools"),
    toggle("fuelConsumption.enabled", "Fuel Consumption", "Enable/disable fuel consumption tweaks"),
    number("fuelConsumption.fuelConsumptionMultiplier", "Fuel Consumption Multiplier", 1.0, 100.0, 1.0, "Fuel consumption multiplier (higher = more fuel used)"),
    toggle("fasterHideoutConstruction.enabled", "Faster Hideout Construction", "Enable/disable faster hideout construction"),
    number("fasterHideoutConstruction.hideoutConstructionTimeMultiplier", "Construction Time Multiplier", 1.0, 1000.0, 1.0, "Construction time multiplier (higher = faster construction)"),
    toggle("scavCaseOptions.enabled", "Scav Case Options", "Enable/disable scav case options"),
    toggle("scavCaseOptions.betterRewards", "Better Scav Rewards", "Improves the quality of scav case rewards"),
    toggle("scavCaseOptions.rebalance", "Rebalance Scav Case", "Rebalances the scav case reward pool and recipes"),
    toggle("scavCaseOptions.fasterScavcase.enabled", "Faster Scavcase", "Enable/disable faster scavcase production"),
    number("scavCaseOptions.fasterScavcase.speedMultiplier", "Scavcase Speed Multiplier", 1.0, 100.0, 1.0, "Speed multiplier for scavcase production"),
    toggle("allowGymTrainingWithMusclePain", "Allow Gym Training With Muscle Pain", "Continue gym training with severe muscle pain at 25% efficiency"),
    toggle("disableFIRHideout", "Disable FIR Hideout", "Disables Found In Raid requirement for hideout upgrades"),
];

const STASH_OPTIONS: &[FieldDescriptor] = &[
    toggle("biggerStash", "Bigger Stash", "Stash lines go from 28/38/48/68 to 50/100/150/200"),
    toggle("progressiveStash", "Progressive Stash", "Every new profile starts with a level 1 stash"),
    toggle("lessCurrencyForConstruction", "Less Currency For Construction", "Reduces cash requirements for stash construction by a multiplier"),
    number("currencyRequirementMultiplier", "Currency Requirement Multiplier", 0.0, 1.0, 0.01, "Multiplier for stash construction currency requirements (0.20 = 20% of original cost)"),
    toggle("easierLoyalty", "Easier Loyalty", "Loyalty requirements for stash construction drop by 1"),
];

const TRADER_CHANGES: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Trader Changes", "Master toggle for all trader changes"),
    toggle("betterSalesToTraders", "Better Sales To Traders", "Traders buy more items for better prices"),
    toggle("alternativeCategories", "Alternative Categories", "Traders have alternative buy categories"),
    toggle("pacifistFence.enabled", "Pacifist Fence", "Enable Pacifist Fence settings"),
    number("pacifistFence.numberOfFenceOffers", "Number Of Fence Offers", 1.0, 100.0, 1.0, "Number of Fence offers"),
    toggle("reasonablyPricedCases", "Reasonably Priced Cases", "Reasonably priced cases"),
    toggle("skierUsesEuros", "Skier Uses Euros", "Skier uses Euros"),
    toggle("biggerLimits.enabled", "Bigger Trader Limits", "Bigger buy/sell limits for traders"),
    number("biggerLimits.multiplier", "Trader Limit Multiplier", 1.0, 10.0, 1.0, "Multiplier for trader buy/sell limits"),
];

const CRAFTING_CHANGES: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Crafting Changes", "Rebalance of crafting recipes around component rarity, usefulness and trader prices"),
    toggle("craftingRebalance", "Crafting Rebalance", "Enable/disable crafting rebalance"),
    toggle("additionalCraftingRecipes", "Additional Crafting Recipes", "New lore-friendly crafting recipes for stims and medical items"),
];

const INSURANCE_CHANGES: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Insurance Changes", "Master toggle for all insurance changes"),
    number("traderInsuranceConfig.fence.insurancePriceCoef", "Fence Insurance Price Coef", 1.0, 100.0, 1.0, "Price coefficient for Fence insurance"),
    number("traderInsuranceConfig.fence.returnChancePercent", "Fence Return Chance (%)", 0.0, 100.0, 1.0, "Chance (percent) to get items back from Fence insurance"),
    number("traderInsuranceConfig.prapor.insurancePriceCoef", "Prapor Insurance Price Coef", 1.0, 100.0, 1.0, "Price coefficient for Prapor insurance"),
    number("traderInsuranceConfig.prapor.returnChancePercent", "Prapor Return Chance (%)", 0.0, 100.0, 1.0, "Chance (percent) to get items back from Prapor insurance"),
    number("traderInsuranceConfig.therapist.insurancePriceCoef", "Therapist Insurance Price Coef", 1.0, 100.0, 1.0, "Price coefficient for Therapist insurance"),
    number("traderInsuranceConfig.therapist.returnChancePercent", "Therapist Return Chance (%)", 0.0, 100.0, 1.0, "Chance (percent) to get items back from Therapist insurance"),
];

const SECURE_CONTAINERS_OPTIONS: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Secure Container Tweaks", "Master toggle for all secure container options"),
    toggle("biggerContainers", "Bigger Containers", "Waist Pouch 2x4, Alpha 3x3, Beta 3x4, Epsilon 3x5, Gamma 4x5, Kappa 5x5"),
    number("CollectorQuestLevelStart", "Collector Quest Level Start", 1.0, 99.0, 1.0, "Collector quest is startable at this level"),
    toggle("progressiveContainers.enabled", "Progressive Containers", "Start new profiles with a 2x2 Waist Pouch and craft up to Gamma"),
];

const ECONOMY_OPTIONS: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Economy Options", "Master toggle for all economy options"),
    toggle("disableFleaMarketCompletely", "Disable Flea Market Completely", "Completely disable the flea market"),
    toggle("priceRebalance.enabled", "Enable Price Rebalance", "Match flea prices to handbook and trader prices"),
    toggle("priceRebalance.itemFixes", "Enable Item Fixes", "Price fixes for important items like the intel folder and military flash drive"),
    toggle("pacifistFleaMarket.enabled", "Enable Pacifist Flea Market", "Only meds, barter items, food and info items can be bought on flea"),
    toggle("pacifistFleaMarket.whitelist.enabled", "Whitelist Enabled", "Small list of items used in crafts and barters is available on flea"),
    number("pacifistFleaMarket.whitelist.priceMultiplier", "Whitelist Price Multiplier", 1.0, 10.0, 0.1, "Price multiplier for whitelist items"),
    toggle("pacifistFleaMarket.questKeys.enabled", "Quest Keys Enabled", "Random-only quest keys are available on flea"),
    number("pacifistFleaMarket.questKeys.priceMultiplier", "Quest Keys Price Multiplier", 1.0, 10.0, 0.1, "Price multiplier for quest keys"),
    toggle("pacifistFleaMarket.markedKeys.enabled", "Marked Keys Enabled", "Marked keys are available on flea"),
    number("pacifistFleaMarket.markedKeys.priceMultiplier", "Marked Keys Price Multiplier", 1.0, 10.0, 0.1, "Price multiplier for marked keys"),
    toggle("barterEconomy.enabled", "Enable Barter Economy", "Flea items can only be bought with other found-in-raid or crafted items"),
    number("barterEconomy.cashOffersPercentage", "Cash Offers Percentage", 0.0, 100.0, 1.0, "Small random percentage of listings buyable for cash"),
    number("barterEconomy.barterPriceVariance", "Barter Price Variance (%)", 0.0, 100.0, 1.0, "Price variance between item listing and barter value"),
    number("barterEconomy.offerItemCount.min", "Offer Item Count Min", 1.0, 100.0, 1.0, "Min number of different offers of an item"),
    number("barterEconomy.offerItemCount.max", "Offer Item Count Max", 1.0, 100.0, 1.0, "Max number of different offers of an item"),
    number("barterEconomy.nonStackableCount.min", "Non-Stackable Count Min", 1.0, 100.0, 1.0, "Min number of items per individual offer"),
    number("barterEconomy.nonStackableCount.max", "Non-Stackable Count Max", 1.0, 100.0, 1.0, "Max number of items per individual offer"),
    number("barterEconomy.itemCountMax", "Item Count Max", 1.0, 100.0, 1.0, "Maximum number of items asked for a barter"),
    toggle("barterEconomy.unbanBitcoinsForBarters", "Unban Bitcoins For Barters", "Allow bitcoins in barters"),
    toggle("otherFleaMarketChanges.enabled", "Other Flea Market Changes Enabled", "Master toggle for other flea market changes"),
    toggle("otherFleaMarketChanges.sellingOnFlea", "Selling On Flea", "Allow selling on the flea market"),
    number("otherFleaMarketChanges.fleaMarketOpenAtLevel", "Flea Market Open At Level", 1.0, 99.0, 1.0, "PMC level the flea market opens at"),
    number("otherFleaMarketChanges.fleaPricesIncreased", "Flea Prices Increased", 1.0, 10.0, 0.1, "Slightly increase flea market prices"),
    toggle("otherFleaMarketChanges.fleaPristineItems", "Flea Pristine Items", "Only pristine condition items are offered on flea"),
    toggle("otherFleaMarketChanges.onlyFoundInRaidItemsAllowedForBarters", "Only FiR Items Allowed For Barters", "Only found in raid items allowed for barters"),
];

const OTHER_TWEAKS: &[FieldDescriptor] = &[
    toggle("enabled", "Enable Other Tweaks", "Master toggle for all other tweaks"),
    toggle("skillExpBuffs", "Skill Exp Buffs", "Buffs to skill experience gain"),
    toggle("signalPistolInSpecialSlots", "Signal Pistol In Special Slots", "Allows the signal pistol in special slots"),
    toggle("unexaminedItemsAreBack", "Unexamined Items Are Back", "Unexamined items are back"),
    toggle("fasterExamineTime", "Faster Examine Time", "Faster examine time for items"),
    toggle("removeBackpackRestrictions", "Remove Backpack Restrictions", "Removes backpack restrictions"),
    toggle("removeDiscardLimit", "Remove Discard Limit", "Removes the discard limit"),
    toggle("reshalaAlwaysHasGoldenTT", "Reshala Always Has Golden TT", "Reshala always carries the Golden TT"),
    toggle("biggerAmmoStacks.enabled", "Bigger Ammo Stacks", "Enable bigger ammo stacks"),
    number("biggerAmmoStacks.stackMultiplier", "Ammo Stack Multiplier", 1.0, 100.0, 1.0, "Multiplier for ammo stack size"),
    toggle("biggerAmmoStacks.botAmmoStackFix", "Bot Ammo Stack Fix", "Fixes bot ammo stack issues"),
    toggle("questChanges", "Quest Changes", "Enable quest changes"),
    toggle("removeRaidItemLimits", "Remove Raid Item Limits", "Removes raid item limits"),
    toggle("biggerCurrencyStacks", "Bigger Currency Stacks", "Enable bigger currency stacks"),
    number("currencyStackSizes.euros", "Euros Stack Size", 1.0, 1_000_000.0, 1.0, "Maximum stack size for euros"),
    number("currencyStackSizes.dollars", "Dollars Stack Size", 1.0, 1_000_000.0, 1.0, "Maximum stack size for dollars"),
    number("currencyStackSizes.gpcoin", "GP Coin Stack Size", 1.0, 1_000_000.0, 1.0, "Maximum stack size for GP coins"),
    number("currencyStackSizes.roubles", "Roubles Stack Size", 1.0, 1_000_000.0, 1.0, "Maximum stack size for roubles"),
    toggle("smallContainersInSpecialSlots", "Small Containers In Special Slots", "Allow small containers in special slots"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_order_is_stable() {
        let keys: Vec<_> = sections().iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            [
                "hideoutOptions",
                "stashOptions",
                "traderChanges",
                "craftingChanges",
                "insuranceChanges",
                "secureContainersOptions",
                "economyOptions",
                "otherTweaks"
            ]
        );
    }

    #[test]
    fn only_bitcoin_price_is_nullable() {
        let nullable: Vec<_> = sections()
            .iter()
            .flat_map(|s| s.fields.iter().filter(|f| f.nullable).map(move |f| s.field_path(f).to_string()))
            .collect();
        assert_eq!(nullable, ["hideoutOptions.fasterBitcoinFarming.bitcoinPrice"]);
    }

    #[test]
    fn coerce_enforces_non_negative_finite_numbers() {
        let (_, gpu) = lookup("hideoutOptions", "fasterBitcoinFarming.gpuEfficiency").expect("field");
        assert_eq!(gpu.coerce(FieldInput::Number(Some(2.0))), Ok(Value::from(2_i64)));
        assert_eq!(gpu.coerce(FieldInput::Number(Some(0.0))), Ok(Value::from(0_i64)));
        assert_eq!(gpu.coerce(FieldInput::Number(Some(-1.0))), Err(FieldError::Negative(gpu.key)));
        assert_eq!(gpu.coerce(FieldInput::Number(Some(f64::NAN))), Err(FieldError::NotFinite(gpu.key)));
        assert_eq!(gpu.coerce(FieldInput::Number(None)), Err(FieldError::Required(gpu.key)));
        assert!(matches!(gpu.coerce(FieldInput::Toggle(true)), Err(FieldError::WrongInput { .. })));
    }

    #[test]
    fn empty_bitcoin_price_becomes_null() {
        let (path, value) = bind(
            "hideoutOptions",
            "fasterBitcoinFarming.bitcoinPrice",
            FieldInput::Number(None),
        )
        .expect("bind");
        assert_eq!(path.to_string(), "hideoutOptions.fasterBitcoinFarming.bitcoinPrice");
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn bind_reports_unknown_targets() {
        assert_eq!(
            bind("nope", "enabled", FieldInput::Toggle(true)),
            Err(FieldError::UnknownSection("nope".to_string()))
        );
        assert!(matches!(
            bind("stashOptions", "enabled", FieldInput::Toggle(true)),
            Err(FieldError::UnknownField { .. })
        ));
    }

    #[test]
    fn input_parsing_follows_widget_kind() {
        assert_eq!(FieldInput::parse(WidgetKind::Toggle, "on"), Ok(FieldInput::Toggle(true)));
        assert_eq!(FieldInput::parse(WidgetKind::Number, " 0.25 "), Ok(FieldInput::Number(Some(0.25))));
        assert_eq!(FieldInput::parse(WidgetKind::Number, "null"), Ok(FieldInput::Number(None)));
        assert!(FieldInput::parse(WidgetKind::Toggle, "maybe").is_err());
        assert!(FieldInput::parse(WidgetKind::Number, "ten").is_err());
    }

    #[test]
    fn find_by_path_splits_section_and_field() {
        let (schema, field) =
            find_by_path(&KeyPath::from("otherTweaks.currencyStackSizes.roubles")).expect("found");
        assert_eq!(schema.key, "otherTweaks");
        assert_eq!(field.label, "Roubles Stack Size");
        assert!(find_by_path(&KeyPath::from("otherTweaks")).is_none());
    }
}
