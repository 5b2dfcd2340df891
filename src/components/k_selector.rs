//! Bounded numeric entry for the neighbor count `k`.

use std::fmt;

use leptos::prelude::*;

/// Upper bound offered for `k`: one less than the row count, but never below 10.
pub fn max_k(rows: usize) -> usize {
	rows.saturating_sub(1).max(10)
}

/// Contents of the text box; empty is allowed while typing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KEntry {
	/// Box cleared while typing.
	Empty,
	/// A committed, in-range value.
	Value(usize),
}

impl fmt::Display for KEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KEntry::Empty => Ok(()),
			KEntry::Value(v) => write!(f, "{}", v),
		}
	}
}

/// Input rules for `k` in `1..=max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KBounds {
	/// Largest accepted value, usually [`max_k`].
	pub max: usize,
}

impl KBounds {
	/// Clamp any integer into `1..=max`.
	pub fn clamp(&self, value: i64) -> usize {
		if value < 1 {
			1
		} else {
			usize::try_from(value).map_or(self.max, |v| v.min(self.max))
		}
	}

	/// Interpret typed text. Non-numeric text leaves the entry unchanged.
	pub fn on_input(&self, text: &str, current: KEntry) -> KEntry {
		let text = text.trim();
		if text.is_empty() {
			return KEntry::Empty;
		}
		match leading_integer(text) {
			Some(v) => KEntry::Value(self.clamp(v)),
			None => current,
		}
	}

	/// Leaving the box always yields a usable value.
	pub fn on_blur(&self, entry: KEntry) -> usize {
		match entry {
			KEntry::Empty => 1,
			KEntry::Value(v) => self.clamp(v as i64),
		}
	}

	/// Whether `+` is enabled.
	pub fn can_increment(&self, entry: KEntry) -> bool {
		matches!(entry, KEntry::Empty) || matches!(entry, KEntry::Value(v) if v < self.max)
	}

	/// Whether `-` is enabled.
	pub fn can_decrement(&self, entry: KEntry) -> bool {
		matches!(entry, KEntry::Empty) || matches!(entry, KEntry::Value(v) if v > 1)
	}

	/// Step up; an empty box becomes 1.
	pub fn increment(&self, entry: KEntry) -> KEntry {
		let current = match entry {
			KEntry::Empty => 0,
			KEntry::Value(v) => v,
		};
		if current < self.max {
			KEntry::Value(current + 1)
		} else {
			entry
		}
	}

	/// Step down; an empty box becomes 1.
	pub fn decrement(&self, entry: KEntry) -> KEntry {
		let current = match entry {
			KEntry::Empty => 2,
			KEntry::Value(v) => v,
		};
		if current > 1 {
			KEntry::Value(current - 1)
		} else {
			entry
		}
	}
}

/// Optional sign followed by at least one digit; trailing text is ignored.
fn leading_integer(text: &str) -> Option<i64> {
	let (negative, digits) = match text.as_bytes().first()? {
		b'-' => (true, &text[1..]),
		b'+' => (false, &text[1..]),
		_ => (false, text),
	};
	let end = digits
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(digits.len());
	if end == 0 {
		return None;
	}
	let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
	Some(if negative { -magnitude } else { magnitude })
}

/// − / text / + control writing committed values into `k`.
#[component]
pub fn KSelector(
	/// Upper bound for `k`.
	#[prop(into)]
	max: Signal<usize>,
	/// Receives every committed value.
	k: RwSignal<usize>,
) -> impl IntoView {
	let entry = RwSignal::new(KEntry::Value(k.get_untracked()));
	let bounds = move || KBounds { max: max.get() };

	let commit = move |next: KEntry| {
		entry.set(next);
		if let KEntry::Value(v) = next {
			k.set(v);
		}
	};

	Effect::new(move |_| {
		let b = bounds();
		if k.get_untracked() > b.max {
			commit(KEntry::Value(b.max));
		}
	});

	view! {
		<div class="controls k-selector" style="display: flex; align-items: center; gap: 10px; margin: 20px 0;">
			<label for="k-value">"K value: "</label>
			<div style="display: flex; align-items: center;">
				<button
					on:click=move |_| commit(bounds().decrement(entry.get_untracked()))
					disabled=move || !bounds().can_decrement(entry.get())
				>
					"-"
				</button>
				<input
					type="text"
					id="k-value"
					prop:value=move || entry.get().to_string()
					on:input=move |ev| {
						commit(bounds().on_input(&event_target_value(&ev), entry.get_untracked()))
					}
					on:blur=move |_| commit(KEntry::Value(bounds().on_blur(entry.get_untracked())))
					style="width: 60px; padding: 5px; text-align: center;"
				/>
				<button
					on:click=move |_| commit(bounds().increment(entry.get_untracked()))
					disabled=move || !bounds().can_increment(entry.get())
				>
					"+"
				</button>
			</div>
			<span style="margin-left: 5px;">{move || format!("(Max: {})", max.get())}</span>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn max_k_has_a_floor_of_ten() {
		assert_eq!(max_k(0), 10);
		assert_eq!(max_k(5), 10);
		assert_eq!(max_k(11), 10);
		assert_eq!(max_k(250), 249);
	}

	#[test]
	fn typing_clamps_into_bounds() {
		let b = KBounds { max: 20 };
		let cur = KEntry::Value(5);
		assert_eq!(b.on_input("12", cur), KEntry::Value(12));
		assert_eq!(b.on_input("0", cur), KEntry::Value(1));
		assert_eq!(b.on_input("-4", cur), KEntry::Value(1));
		assert_eq!(b.on_input("100", cur), KEntry::Value(20));
		assert_eq!(b.on_input("99999999999999999999999", cur), KEntry::Value(20));
		assert_eq!(b.on_input("7abc", cur), KEntry::Value(7));
	}

	#[test]
	fn typing_tolerates_empty_and_ignores_garbage() {
		let b = KBounds { max: 20 };
		assert_eq!(b.on_input("", KEntry::Value(5)), KEntry::Empty);
		assert_eq!(b.on_input("abc", KEntry::Value(5)), KEntry::Value(5));
		assert_eq!(b.on_input("-", KEntry::Empty), KEntry::Empty);
	}

	#[test]
	fn blur_commits_a_usable_value() {
		let b = KBounds { max: 20 };
		assert_eq!(b.on_blur(KEntry::Empty), 1);
		assert_eq!(b.on_blur(KEntry::Value(9)), 9);
		assert_eq!(KBounds { max: 10 }.on_blur(KEntry::Value(15)), 10);
	}

	#[test]
	fn stepping_stops_at_bounds() {
		let b = KBounds { max: max_k(3) };
		assert_eq!(b.max, 10);
		assert_eq!(b.increment(KEntry::Empty), KEntry::Value(1));
		assert_eq!(b.decrement(KEntry::Empty), KEntry::Value(1));
		assert_eq!(b.increment(KEntry::Value(10)), KEntry::Value(10));
		assert_eq!(b.decrement(KEntry::Value(1)), KEntry::Value(1));
		assert!(!b.can_increment(KEntry::Value(10)));
		assert!(!b.can_decrement(KEntry::Value(1)));
		assert!(b.can_decrement(KEntry::Value(2)));
	}

	#[test]
	fn entry_displays_as_text_box_contents() {
		assert_eq!(KEntry::Empty.to_string(), "");
		assert_eq!(KEntry::Value(4).to_string(), "4");
	}
}
