// Built-in sensor tables per installation category.
//
// Install tables are addressed through `{install_index}`; summary and totals
// tables only use fixed or root-aggregated paths.

use crate::models::{AttributeDescriptor, Category, FieldDescriptor, NonePolicy};

const WATT: &str = "W";
const KWH: &str = "kWh";
const CUBIC_METER: &str = "m³";
const EUR_PER_KWH: &str = "€/kWh";
const EUR_PER_M3: &str = "€/m³";

/// Upstream prices are integers in 1e-7 euro.
const PRICE_FACTOR: f64 = 0.000_000_1;
const KILO_FACTOR: f64 = 0.001;

pub const SUMMARY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("usage", "summary_data.usage.value", "Zonneplan current usage")
        .with_unit(WATT),
    FieldDescriptor::new(
        "usage_measured_at",
        "summary_data.usage.measured_at",
        "Zonneplan current usage measured at",
    )
    .timestamp(),
    FieldDescriptor::new(
        "electricity_price",
        "summary_data.effective_price",
        "Zonneplan current electricity tariff",
    )
    .with_unit(EUR_PER_KWH)
    .with_factor(PRICE_FACTOR)
    .with_attributes(&[AttributeDescriptor {
        label: "forecast",
        path: "summary_data.price_per_hour",
    }]),
    FieldDescriptor::new(
        "gas_price",
        "summary_data.gas_price",
        "Zonneplan current gas tariff",
    )
    .with_unit(EUR_PER_M3)
    .with_factor(PRICE_FACTOR),
    FieldDescriptor::new(
        "gas_price_next",
        "summary_data.gas_price_next",
        "Zonneplan next gas tariff",
    )
    .with_unit(EUR_PER_M3)
    .with_factor(PRICE_FACTOR),
    FieldDescriptor::new(
        "sustainability_score",
        "summary_data.sustainability_score",
        "Zonneplan sustainability score",
    )
    .with_unit("%")
    .with_factor(0.1),
    FieldDescriptor::new(
        "electricity_tariff_group",
        "summary_data.tariff_group",
        "Zonneplan tariff group",
    ),
    FieldDescriptor::new(
        "status_message",
        "summary_data.status_message",
        "Zonneplan status message",
    ),
    FieldDescriptor::new("status_tip", "summary_data.status_tip", "Zonneplan status tip"),
];

pub const PV_INSTALL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "pv_total_power_measured",
        "pv_installation.{install_index}.meta.total_power_measured",
        "Zonneplan yield total",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR)
    .with_none_policy(NonePolicy::KeepPrevious),
    FieldDescriptor::new(
        "pv_last_measured_at",
        "pv_installation.{install_index}.meta.last_measured_at",
        "Zonneplan last measured",
    )
    .timestamp(),
    FieldDescriptor::new(
        "pv_first_measured_at",
        "pv_installation.{install_index}.meta.first_measured_at",
        "Zonneplan first measured",
    )
    .timestamp(),
    FieldDescriptor::new(
        "pv_power_production",
        "pv_installation.{install_index}.meta.last_measured_power_value",
        "Zonneplan current power",
    )
    .with_unit(WATT)
    .with_none_policy(NonePolicy::TreatAsZero),
    FieldDescriptor::new(
        "pv_installation_power",
        "pv_installation.{install_index}.meta.installation_wp",
        "Zonneplan installation power",
    )
    .with_unit("Wp"),
    FieldDescriptor::new(
        "pv_expected_surplus",
        "pv_installation.{install_index}.meta.expected_surplus_kwh",
        "Zonneplan expected surplus",
    )
    .with_unit(KWH)
    .with_daily_update_hour(6),
];

pub const PV_TOTALS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "pv_yield_today",
        "pv_data.measurement_groups.0.total",
        "Zonneplan yield today",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR)
    .with_last_reset("pv_data.measurement_groups.0.date")
    .with_none_policy(NonePolicy::TreatAsZero),
    FieldDescriptor::new(
        "pv_yield_yesterday",
        "pv_data.measurement_groups.1.total",
        "Zonneplan yield yesterday",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR)
    .with_last_reset("pv_data.measurement_groups.1.date")
    .with_daily_update_hour(1),
];

pub const P1_INSTALL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "electricity_delivery",
        "p1_installation.{install_index}.meta.electricity_last_measured_delivery_value",
        "Zonneplan current electricity usage",
    )
    .with_unit(WATT)
    .with_none_policy(NonePolicy::KeepPrevious),
    FieldDescriptor::new(
        "electricity_production",
        "p1_installation.{install_index}.meta.electricity_last_measured_production_value",
        "Zonneplan current electricity production",
    )
    .with_unit(WATT)
    .with_none_policy(NonePolicy::KeepPrevious),
    FieldDescriptor::new(
        "electricity_average",
        "p1_installation.{install_index}.meta.electricity_last_measured_average_value",
        "Zonneplan average electricity usage",
    )
    .with_unit(WATT),
    FieldDescriptor::new(
        "electricity_first_measured_at",
        "p1_installation.{install_index}.meta.electricity_first_measured_at",
        "Zonneplan electricity first measured",
    )
    .timestamp(),
    FieldDescriptor::new(
        "electricity_last_measured_at",
        "p1_installation.{install_index}.meta.electricity_last_measured_at",
        "Zonneplan electricity last measured",
    )
    .timestamp(),
    FieldDescriptor::new(
        "gas_first_measured_at",
        "p1_installation.{install_index}.meta.gas_first_measured_at",
        "Zonneplan gas first measured",
    )
    .timestamp(),
    FieldDescriptor::new(
        "gas_last_measured_at",
        "p1_installation.{install_index}.meta.gas_last_measured_at",
        "Zonneplan gas last measured",
    )
    .timestamp(),
];

pub const P1_TOTALS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "electricity_consumption_today",
        "electricity_data.measurement_groups.0.meta.delivery",
        "Zonneplan electricity consumption today",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR)
    .with_last_reset("electricity_data.measurement_groups.0.date")
    .with_none_policy(NonePolicy::TreatAsZero),
    FieldDescriptor::new(
        "electricity_production_today",
        "electricity_data.measurement_groups.0.meta.production",
        "Zonneplan electricity production today",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR)
    .with_last_reset("electricity_data.measurement_groups.0.date")
    .with_none_policy(NonePolicy::TreatAsZero),
    FieldDescriptor::new(
        "gas_today",
        "gas_data.measurement_groups.0.total",
        "Zonneplan gas usage today",
    )
    .with_unit(CUBIC_METER)
    .with_factor(KILO_FACTOR)
    .with_last_reset("gas_data.measurement_groups.0.date")
    .with_none_policy(NonePolicy::TreatAsZero)
    .with_daily_update_hour(7),
];

pub const CHARGE_POINT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "charge_point_state",
        "charge_point_installation.{install_index}.state.state",
        "Zonneplan charge point state",
    ),
    FieldDescriptor::new(
        "charge_point_power",
        "charge_point_installation.{install_index}.state.power_actual",
        "Zonneplan charge point power",
    )
    .with_unit(WATT)
    .with_none_policy(NonePolicy::TreatAsZero),
    FieldDescriptor::new(
        "charge_point_energy_delivered",
        "charge_point_installation.{install_index}.state.energy_delivered_session",
        "Zonneplan charge point session energy",
    )
    .with_unit(KWH)
    .with_factor(KILO_FACTOR),
    FieldDescriptor::new(
        "charge_point_start_mode",
        "charge_point_installation.{install_index}.state.start_mode",
        "Zonneplan charge point start mode",
    ),
    FieldDescriptor::new(
        "charge_point_connectivity",
        "charge_point_installation.{install_index}.state.connectivity_state",
        "Zonneplan charge point connectivity",
    ),
    FieldDescriptor::new(
        "charge_point_session_started_at",
        "charge_point_installation.{install_index}.state.session_started_at",
        "Zonneplan charge point session start",
    )
    .timestamp(),
];

/// Per-installation fields of `category` (empty for summary).
pub fn install_fields(category: Category) -> &'static [FieldDescriptor] {
    match category {
        Category::Summary => &[],
        Category::Photovoltaic => PV_INSTALL_FIELDS,
        Category::GridMeter => P1_INSTALL_FIELDS,
        Category::ChargePoint => CHARGE_POINT_FIELDS,
    }
}

/// Non-indexed fields of `category`: summary fields or totals.
pub fn aggregate_fields(category: Category) -> &'static [FieldDescriptor] {
    match category {
        Category::Summary => SUMMARY_FIELDS,
        Category::Photovoltaic => PV_TOTALS_FIELDS,
        Category::GridMeter => P1_TOTALS_FIELDS,
        Category::ChargePoint => &[],
    }
}

pub fn all_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
    Category::ALL
        .into_iter()
        .flat_map(|c| install_fields(c).iter().chain(aggregate_fields(c)))
}

pub fn is_known_key(key: &str) -> bool {
    all_fields().any(|d| d.key == key)
}
