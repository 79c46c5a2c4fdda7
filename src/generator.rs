//! Rule-based training-plan generator
//!
//! The guaranteed-available fallback behind the AI path: composes a full
//! session plan from fixed per-goal exercise pools using only local
//! computation. The selection is seeded from (user, calendar day, request),
//! so regenerating with the same inputs on the same day gives the same plan
//! while different days shuffle the material, and stations a coach saw in
//! the last two weeks are avoided while the pool allows it.
//!
//! Total over all inputs: malformed parameters degrade to defaults, an
//! unreachable history store just disables the repetition check.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::db::DbPool;
use crate::models::{AgeBand, Goal, TrainingRequestParams};
use crate::recent;

/// Approximate time allotted to each main-part station
const STATION_MINUTES: u32 = 8;

/// Fixed cool-down reserve (plus one minute of slack absorbed into spacing)
const COOL_DOWN_MINUTES: u32 = 5;

/// ---------------------------------------------------------------------------
/// Public entry point
/// ---------------------------------------------------------------------------

/// Generate a plan for this coach, avoiding recently used stations
pub async fn generate(db: &DbPool, user_id: &str, params: &TrainingRequestParams) -> String {
  let exclusions = recent::recent_blocks(
    db,
    user_id,
    recent::DEFAULT_WINDOW_DAYS,
    recent::DEFAULT_MAX_PLAN_ENTRIES,
  )
  .await;

  compose_plan(user_id, params, &exclusions, Utc::now().date_naive())
}

/// ---------------------------------------------------------------------------
/// Timing
/// ---------------------------------------------------------------------------

fn warmup_minutes(duration: u32) -> u32 {
  if duration >= 40 {
    8
  } else {
    6
  }
}

/// Roughly one station per 8 working minutes, never fewer than two
fn station_count(duration: u32, warmup: u32) -> usize {
  let working = duration.saturating_sub(warmup + 6);
  ((working / STATION_MINUTES) as usize).max(2)
}

/// ---------------------------------------------------------------------------
/// Seed derivation
/// ---------------------------------------------------------------------------

/// Derive the shuffle seed from the request identity
///
/// SHA-256 over a fixed field order rather than `DefaultHasher`, so the
/// same-day determinism holds across processes and builds.
pub fn derive_seed(user_id: &str, date: NaiveDate, params: &TrainingRequestParams) -> u64 {
  let key = format!(
    "{}|{}|{}|{}|{}|{}",
    user_id,
    date.format("%Y-%m-%d"),
    params.goal.trim().to_lowercase(),
    params.age_band.trim().to_uppercase(),
    params.effective_group_size(),
    params.effective_duration(),
  );

  let digest = Sha256::digest(key.as_bytes());
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&digest[..8]);
  u64::from_be_bytes(bytes)
}

/// ---------------------------------------------------------------------------
/// Exercise pools
/// ---------------------------------------------------------------------------

/// Fixed per-goal pool of (title, instruction) stations
///
/// Instructions with an equipment variant pick it inline based on the
/// request's inventory tags. Titles must never contain a colon - the
/// station-line grammar ends the title at the first one.
fn exercise_pool(goal: Goal, params: &TrainingRequestParams) -> Vec<(&'static str, String)> {
  match goal {
    Goal::Speed => vec![
      (
        "Старты из разных положений",
        "по сигналу рывок 5 м из упора лёжа, из седа и спиной вперёд, 6-8 повторов".to_string(),
      ),
      (
        "Скоростные удары на лапах",
        if params.has_inventory("лапы") {
          "серии доллё-чаги по лапам на максимальной частоте, 3 подхода по 20 сек".to_string()
        } else {
          "серии доллё-чаги по воздуху на максимальной частоте с контролем техники, 3 подхода по 20 сек".to_string()
        },
      ),
      (
        "Челночный бег",
        "челнок 4x9 м с касанием линии, 4-6 серий, отдых 45 сек".to_string(),
      ),
      (
        "Частота на скакалке",
        if params.has_inventory("скакалка") {
          "скакалка на максимальной частоте, 3 раунда по 40 сек".to_string()
        } else {
          "бег на месте с высоким подниманием бедра, 3 раунда по 40 сек".to_string()
        },
      ),
      (
        "Реакция в парах",
        "партнёр хлопком задаёт сигнал на уклон или встречный удар, 2 раунда по 90 сек".to_string(),
      ),
      (
        "Взрывные выпрыгивания",
        "выпрыгивания из полуприседа с махом руками, 3 подхода по 10".to_string(),
      ),
    ],
    Goal::Strength => vec![
      (
        "Отжимания с хлопком",
        "взрывные отжимания, колени на полу для младших, 3 подхода по 8-12".to_string(),
      ),
      (
        "Парные приседания",
        "приседания спина к спине с партнёром, 3 подхода по 12".to_string(),
      ),
      (
        "Удары с сопротивлением",
        if params.has_inventory("резина") {
          "доллё-чаги с резиновой лентой на бедре, 3 подхода по 10 на каждую ногу".to_string()
        } else {
          "медленные доллё-чаги с фиксацией в конечной точке, 3 подхода по 10 на каждую ногу".to_string()
        },
      ),
      (
        "Планка с переходами",
        "планка на предплечьях с переходом в упор лёжа, 3 подхода по 40 сек".to_string(),
      ),
      (
        "Выпады с ударом",
        "выпад назад с последующим ап-чаги передней ногой, 3 подхода по 10 на сторону".to_string(),
      ),
      (
        "Подъёмы корпуса",
        "подъёмы корпуса с касанием стоп, 3 подхода по 15".to_string(),
      ),
    ],
    Goal::Endurance => vec![
      (
        "Круговая работа",
        "4 круга: берпи, приседания, удары руками, прыжки звездой, по 30 сек каждое".to_string(),
      ),
      (
        "Бой с тенью",
        "три раунда по 2 мин без пауз между комбинациями, темп средний и выше".to_string(),
      ),
      (
        "Прыжки на скакалке",
        if params.has_inventory("скакалка") {
          "скакалка в ровном темпе, 3 раунда по 2 мин".to_string()
        } else {
          "прыжки на месте со сменой стойки, 3 раунда по 2 мин".to_string()
        },
      ),
      (
        "Интервалы на щитах",
        if params.has_inventory("щиты") {
          "20 сек ударов по щиту / 10 сек отдыха, 8 циклов".to_string()
        } else {
          "20 сек ударов по воздуху / 10 сек отдыха, 8 циклов".to_string()
        },
      ),
      (
        "Берпи-серии",
        "лесенка берпи 10-8-6-4-2 с шагом-восстановлением между ступенями".to_string(),
      ),
      (
        "Степ-перемещения",
        "непрерывные перемещения в стойке со сменой направления по команде, 3 мин".to_string(),
      ),
    ],
    Goal::Flexibility => vec![
      (
        "Динамические махи",
        "махи вперёд, в сторону и по дуге с опорой на стену, по 10 на ногу".to_string(),
      ),
      (
        "Растяжка в парах",
        "партнёр мягко дожимает подъём ноги вперёд и в сторону, по 20 сек, без рывков".to_string(),
      ),
      (
        "Шпагатные позиции",
        "продольный и поперечный шпагат с опорой, 3 подхода по 30 сек".to_string(),
      ),
      (
        "Наклоны и скручивания",
        "наклоны к прямым ногам сидя и скручивания корпуса, по 8 в каждую сторону".to_string(),
      ),
      (
        "Мостик и плечевой пояс",
        "мостик из положения лёжа и вращения рук с захватом, 3 подхода".to_string(),
      ),
      (
        "Удержание ноги",
        "медленный подъём и удержание ноги в ап-чаги, 3 подхода по 15 сек на ногу".to_string(),
      ),
    ],
    Goal::Agility => vec![
      (
        "Лестница координации",
        if params.has_inventory("лестница") {
          "бег через координационную лестницу разными схемами шагов, 4 прохода".to_string()
        } else {
          "схемы шагов по разметке мелом вместо лестницы, 4 прохода".to_string()
        },
      ),
      (
        "Конусные перемещения",
        if params.has_inventory("конусы") {
          "змейка между конусами лицом и спиной вперёд, 4 прохода".to_string()
        } else {
          "змейка между линиями зала лицом и спиной вперёд, 4 прохода".to_string()
        },
      ),
      (
        "Зеркальная работа",
        "партнёр двигается произвольно, второй зеркалит его перемещения, 2 раунда по 60 сек".to_string(),
      ),
      (
        "Кувырки и подъёмы",
        "кувырок вперёд с выходом в боевую стойку, 2 серии по 6".to_string(),
      ),
      (
        "Салки в стойке",
        "салки касанием плеча в боевой стойке, 3 раунда по 45 сек".to_string(),
      ),
      (
        "Уклоны по сигналу",
        "уклоны и смена уровня по хлопку тренера, 2 раунда по 60 сек".to_string(),
      ),
    ],
    Goal::General => vec![
      (
        "Базовая техника",
        "повторение базовых ударов и блоков на месте и в перемещении, 2 серии".to_string(),
      ),
      (
        "ОФП-комплекс",
        "отжимания, приседания, подъёмы корпуса по 12-15 повторов, 3 круга".to_string(),
      ),
      (
        "Работа в парах",
        "отработка комбинаций на два-три удара с лёгким контактом".to_string(),
      ),
      (
        "Пхумсэ",
        "прогон формы своего уровня целиком и по счёту, 3-4 повтора".to_string(),
      ),
      (
        "Эстафета",
        "командная эстафета с элементами перемещений и ударов".to_string(),
      ),
      (
        "Игровые задания",
        "игровые задания на равновесие и стойку по выбору тренера".to_string(),
      ),
    ],
  }
}

/// ---------------------------------------------------------------------------
/// Age-band coaching notes
/// ---------------------------------------------------------------------------

fn age_band_note(band: AgeBand) -> &'static str {
  match band {
    AgeBand::Youngest => {
      "Младшая группа: координация, реакция, малые объёмы, игровая форма. Тяжёлой силовой работы избегать."
    }
    AgeBand::Middle => {
      "Группа 10-13 лет: акцент на скоростно-силовую работу и ловкость, объёмы умеренные."
    }
    AgeBand::OlderYouth => {
      "Старшие юноши: силовая и скоростная работа плюс дозированная интервальная выносливость."
    }
    AgeBand::Adult => {
      "Взрослая группа: нагрузка подбирается индивидуально, целевое RPE 7-8 на основных блоках."
    }
  }
}

/// ---------------------------------------------------------------------------
/// Composition
/// ---------------------------------------------------------------------------

/// Compose the plan text for a fixed calendar date
///
/// Pure function of its arguments; `generate` passes today's UTC date.
pub fn compose_plan(
  user_id: &str,
  params: &TrainingRequestParams,
  exclusions: &HashSet<String>,
  date: NaiveDate,
) -> String {
  let duration = params.effective_duration();
  let warmup = warmup_minutes(duration);
  let wanted = station_count(duration, warmup);

  let goal = Goal::from_param(&params.goal);
  let pool = exercise_pool(goal, params);

  let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(user_id, date, params));

  // Prefer stations the coach has not seen in the last window
  let mut fresh: Vec<usize> = (0..pool.len())
    .filter(|&i| !exclusions.contains(&pool[i].0.to_lowercase()))
    .collect();
  if fresh.is_empty() {
    fresh = (0..pool.len()).collect();
  }
  fresh.shuffle(&mut rng);

  let mut chosen: Vec<usize> = fresh.into_iter().take(wanted).collect();

  // Top up from the rest of the pool only when fresh supply ran short
  if chosen.len() < wanted {
    let mut leftover: Vec<usize> = (0..pool.len()).filter(|i| !chosen.contains(i)).collect();
    leftover.shuffle(&mut rng);
    chosen.extend(leftover.into_iter().take(wanted - chosen.len()));
  }

  let goal_label = non_empty_or(&params.goal, "Общая");
  let age_label = non_empty_or(&params.age_band, "U13");
  let location_label = non_empty_or(&params.location, "Зал");
  let inventory_label = if params.inventory { "да" } else { "нет" };

  let mut plan = String::new();
  plan.push_str(&format!(
    "🧠 Rule-Based | {} мин | {} | {} | {} | группа: {} чел | инвентарь: {}\n\n",
    duration,
    age_label,
    location_label,
    goal_label,
    params.effective_group_size(),
    inventory_label,
  ));

  plan.push_str(&format!(
    "Разминка (RAMP: Raise, Activate, Mobilize, Potentiate) — {} мин\n\n",
    warmup
  ));

  for (slot, &idx) in chosen.iter().enumerate() {
    let (title, instruction) = &pool[idx];
    let letter = char::from(b'A' + slot as u8);
    plan.push_str(&format!(
      "Станция {} — {}: {} (~{} мин)\n",
      letter, title, instruction, STATION_MINUTES
    ));
  }

  plan.push_str("\nИгра / лёгкий спарринг — свободная работа в парах с контролем контакта\n");
  plan.push_str(&format!(
    "Заминка — {} мин. Восстановительное дыхание и лёгкая растяжка\n\n",
    COOL_DOWN_MINUTES
  ));

  plan.push_str("Заметки тренера:\n");
  plan.push_str(&format!("- {}\n", age_band_note(AgeBand::from_param(&params.age_band))));
  plan.push_str("- Целевое RPE на станциях 7-8, разминка и заминка не выше 4.\n");
  plan.push_str("- Делите группу на подгруппы по станциям, чтобы сократить очереди.\n");

  plan
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    fallback
  } else {
    trimmed
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
