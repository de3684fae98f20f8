//! Canned coaching text.

use crate::types::Exercise;

/// Coaching cue and action items for a specific drill
pub(crate) fn exercise_cue(exercise: Exercise) -> (&'static str, &'static [&'static str]) {
    match exercise {
        Exercise::Plank => (
            "Hold a straight line from shoulders to heels. This is the same bracing you need to stay stable in the suit.",
            &["Squeeze glutes and brace your core", "Keep your neck neutral", "Breathe steadily, don't hold your breath"],
        ),
        Exercise::SingleLegStand => (
            "Single-leg balance trains the ankle and hip stabilizers you rely on after landing.",
            &["Fix your gaze on one point", "Keep a soft bend in the standing knee", "Switch legs every 30 seconds"],
        ),
        Exercise::Squat => (
            "Squats build the leg strength for lunar surface work under load.",
            &["Push your knees out over your toes", "Keep your chest up", "Drive up through your heels"],
        ),
        Exercise::Pushup => (
            "Push-ups build the upper-body endurance needed for translation along the truss.",
            &["Hands just wider than shoulders", "Lower with control", "Keep hips level with shoulders"],
        ),
        Exercise::Burpee => (
            "Burpees simulate getting up from a fall in a bulky suit. Smooth beats fast.",
            &["Land softly", "Keep the plank position solid", "Pace your breathing between reps"],
        ),
        Exercise::TreadmillIntervals => (
            "Interval running builds the aerobic base for long EVAs.",
            &["Stay in the target heart-rate zone", "Use the recovery intervals fully", "Keep your stride short and quick"],
        ),
        Exercise::RowingIntervals => (
            "Rowing works legs, core and back together, like a full EVA day.",
            &["Legs, then back, then arms", "Keep the stroke rate controlled", "Relax your grip on the recovery"],
        ),
        Exercise::SuitDonning => (
            "Follow the donning checklist in order. Speed comes from consistency.",
            &["Call out each checklist step", "Verify every seal twice", "Check the comms link before closing the helmet"],
        ),
        Exercise::TetherManagement => (
            "Never be untethered. Make before break on every tether swap.",
            &["Attach the new tether before releasing the old one", "Confirm the gate lock visually", "Keep tethers clear of your tools"],
        ),
        Exercise::ToolHandling => (
            "Gloved hands tire fast. Let the tool do the work.",
            &["Use a relaxed grip", "Secure every tool to a tether", "Rest your hands between tasks"],
        ),
        Exercise::AirlockProcedure => (
            "Airlock procedures are checklist driven. Read back every step.",
            &["Confirm pressure readings before proceeding", "Verify hatch seals", "Report each step to the flight controller"],
        ),
        Exercise::VestibularChair => (
            "Rotating-chair work adapts your inner ear for launch and landing.",
            &["Keep your head still unless instructed", "Focus on slow breathing", "Signal immediately if nausea builds"],
        ),
    }
}

/// Question keyword sets, checked in order; the first set with any keyword
/// contained in the question wins.
pub(crate) const QUESTION_TOPICS: &[(&[&str], &str)] = &[
    (
        &["heart rate", "heart-rate", "pulse", "bpm"],
        "Aim to keep your heart rate between 120 and 150 bpm during conditioning work. Above 160, slow down and let it recover before the next set.",
    ),
    (
        &["oxygen", "o2", "saturation", "breath"],
        "Oxygen saturation should stay above 95%. Slow, deep breathing through the nose helps. If it drops further, stop and rest.",
    ),
    (
        &["balance", "dizzy", "vestibular", "stability"],
        "Balance comes from ankles, hips and the inner ear working together. Train it daily, and pick a fixed visual point when you feel unsteady.",
    ),
    (
        &["form", "technique", "posture"],
        "Good form beats more reps. Slow down, brace your core and keep joints aligned. Quality movement now prevents injuries in the suit.",
    ),
    (
        &["eva", "spacewalk", "suit", "tether"],
        "EVA readiness combines grip endurance, core strength and procedure discipline. Keep practicing the checklists until they feel automatic.",
    ),
    (
        &["tired", "fatigue", "rest", "recover", "sleep"],
        "Recovery is part of training. Sleep, hydration and rest days are when your body adapts. Listen to fatigue signals.",
    ),
    (
        &["nutrition", "eat", "food", "protein", "hydrat"],
        "Fuel your training with enough protein and carbohydrates, and stay hydrated. In microgravity you lose muscle and bone fast, so nutrition matters.",
    ),
    (
        &["mission", "progress", "ready", "readiness"],
        "Mission readiness tracks your completed modules and assessments. Keep a steady cadence and the progress will follow.",
    ),
];

pub(crate) const DEFAULT_ANSWER: &str = "Good question. Stay consistent with your training plan and focus on form. Ask me about heart rate, balance, EVA skills, recovery or nutrition for specific advice.";

pub(crate) const DEFAULT_GUIDANCE: &str = "Keep going. Stay focused on your form and breathing.";
