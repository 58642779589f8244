use crate::logic::calculations::{month_name, Trend, TrendField};
use crate::models::{DailySummary, Season};
use serde::Serialize;

/// More summer days than this above [`HEAT_TASK_C`] add a heat-stress task
const HEAT_TASK_DAYS: usize = 10;
const HEAT_TASK_C: f64 = 32.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTasks {
    pub month: &'static str,
    pub tasks: Vec<String>,
}

/// Seasonal farm work plan adjusted for observed trends and history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalGuidance {
    pub season: Season,
    pub summary: String,
    pub monthly_tasks: Vec<MonthlyTasks>,
}

struct SeasonPlan {
    summary: &'static str,
    tasks: [[&'static str; 4]; 3],
}

fn plan(season: Season) -> SeasonPlan {
    match season {
        Season::Winter => SeasonPlan {
            summary: "Winter planning focuses on soil preparation, equipment maintenance and planning for spring planting. \
                      Review your crop rotation plans and order seeds well in advance. Consider conducting soil tests to \
                      determine nutrient needs for spring.",
            tasks: [
                [
                    "Maintain drainage systems to prevent waterlogging",
                    "Service farm equipment while activity is low",
                    "Analyze previous season's data and plan crop rotations",
                    "Check stored crops for signs of spoilage or pests",
                ],
                [
                    "Order seeds and supplies for spring planting",
                    "Conduct soil tests to determine spring fertilizer needs",
                    "Repair fences, buildings, and other infrastructure",
                    "Monitor overwintering crops for frost damage",
                ],
                [
                    "Start seedlings indoors for early spring crops",
                    "Begin pruning fruit trees before bud break",
                    "Apply winter fertilizers if ground is not frozen",
                    "Plan irrigation system maintenance before spring",
                ],
            ],
        },
        Season::Spring => SeasonPlan {
            summary: "Spring is the critical planting season. Prepare your fields once soil temperatures reach appropriate levels, \
                      being careful not to work wet soil. Monitor for early season pests as temperatures warm and implement \
                      your integrated pest management strategies.",
            tasks: [
                [
                    "Prepare seedbeds once soil has dried sufficiently",
                    "Apply pre-planting fertilizers based on soil tests",
                    "Set up weather monitoring stations for the growing season",
                    "Begin early season weed control measures",
                ],
                [
                    "Plant main season crops when soil temperature is optimal",
                    "Implement irrigation system as needed for germination",
                    "Monitor for early season pests and diseases",
                    "Apply post-emergence herbicides as needed",
                ],
                [
                    "Complete planting of all warm-season crops",
                    "Thin seedlings to appropriate spacing",
                    "Begin regular scouting for pests and diseases",
                    "Apply side-dress fertilizers for early planted crops",
                ],
            ],
        },
        Season::Summer => SeasonPlan {
            summary: "Summer is focused on crop management, irrigation and pest control. Monitor soil moisture regularly \
                      and adjust irrigation schedules based on weather conditions and crop needs. Stay vigilant for \
                      pest and disease pressures which increase in warm weather.",
            tasks: [
                [
                    "Implement efficient irrigation scheduling based on crop needs",
                    "Monitor for insect pests with increased activity in warm weather",
                    "Apply foliar fertilizers if tissue tests indicate deficiencies",
                    "Prepare for harvest of early season crops",
                ],
                [
                    "Maintain consistent irrigation during peak water demand",
                    "Continue regular pest and disease monitoring",
                    "Apply fungicides preventatively during periods of high humidity",
                    "Plan for cover crop seeding after early harvests",
                ],
                [
                    "Monitor crops for signs of heat stress",
                    "Adjust irrigation to account for any rainfall",
                    "Prepare harvesting equipment for upcoming harvest season",
                    "Begin soil preparation for fall planted crops",
                ],
            ],
        },
        Season::Fall => SeasonPlan {
            summary: "Fall is harvest season and preparation for the following year. Focus on timely harvesting, proper crop storage \
                      and establishment of winter cover crops. Perform post-harvest soil management practices and evaluate the \
                      season's performance for future planning.",
            tasks: [
                [
                    "Harvest crops at optimal maturity to maximize quality",
                    "Plant cover crops in harvested fields to prevent erosion",
                    "Conduct soil testing after harvest to plan winter amendments",
                    "Clean and prepare storage facilities",
                ],
                [
                    "Complete main crop harvest before frost damage",
                    "Apply fall fertilizers and soil amendments",
                    "Plant winter grains if part of rotation",
                    "Winterize irrigation systems to prevent freeze damage",
                ],
                [
                    "Finish any remaining harvest activities",
                    "Complete fall tillage operations where appropriate",
                    "Apply winter weed control measures",
                    "Analyze yield data and begin planning for next season",
                ],
            ],
        },
    }
}

fn trend_advice(trend: &Trend) -> Option<&'static str> {
    match (trend.field, trend.per_month > 0.0) {
        (TrendField::Temperature, true) => Some(
            "Due to the warming trend, consider selecting heat-tolerant crop varieties and adjusting planting dates accordingly.",
        ),
        (TrendField::Temperature, false) => Some(
            "With the cooling trend observed, be prepared for potential early frosts and consider cold-hardy varieties.",
        ),
        (TrendField::Precipitation, true) => Some(
            "The increasing precipitation trend suggests investing in improved drainage systems and raising beds for crops sensitive to waterlogging.",
        ),
        (TrendField::Precipitation, false) => Some(
            "With decreasing precipitation levels, prioritize drought-resistant crop varieties and efficient irrigation methods.",
        ),
        (TrendField::Humidity, _) => None,
    }
}

/// Work plan for `season`, with month names for the hemisphere.
///
/// Temperature and precipitation trends extend the summary. Frost in the
/// history adds a late-frost task mid-spring; more than ten days above
/// 32°C add a heat-stress task mid-summer.
pub fn seasonal_guidance(
    season: Season,
    northern: bool,
    trends: &[Trend],
    days: &[DailySummary],
) -> SeasonalGuidance {
    let plan = plan(season);

    let mut summary = plan.summary.to_string();
    for advice in trends.iter().filter_map(trend_advice) {
        summary.push(' ');
        summary.push_str(advice);
    }

    let mut monthly_tasks: Vec<MonthlyTasks> = season
        .months(northern)
        .into_iter()
        .zip(plan.tasks)
        .map(|(month, tasks)| MonthlyTasks {
            month: month_name(month),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        })
        .collect();

    let frost_days = days.iter().filter(|d| d.temp_min_c < 0.0).count();
    if season == Season::Spring && frost_days > 0 {
        monthly_tasks[1]
            .tasks
            .push("Be prepared for potential late frosts based on historical patterns".into());
    }

    let heat_days = days.iter().filter(|d| d.temp_max_c > HEAT_TASK_C).count();
    if season == Season::Summer && heat_days > HEAT_TASK_DAYS {
        monthly_tasks[1].tasks.push(
            "Implement heat stress management strategies during historically high-temperature periods"
                .into(),
        );
    }

    SeasonalGuidance {
        season,
        summary,
        monthly_tasks,
    }
}
