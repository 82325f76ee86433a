/// Host member handles and the interop contract.
///
/// Declares the object value, the property/method/indexer handles the reducer
/// carries inside expression nodes, and the `HostInterop` trait through which
/// every host call is made.
///
/// # Responsibilities
/// - Defines `ObjectValue` for opaque host instances.
/// - Defines the member handle types and their invocation helpers.
/// - Declares the `HostInterop` collaborator interface.
pub mod object;
/// The concrete host object model.
///
/// A registry of namespaced type definitions with constructors, static
/// members, properties, methods and indexers, plus built-in members for the
/// primitive value types. Member resolution is cached in a read-mostly map.
///
/// # Responsibilities
/// - Registers type definitions and resolves members by name.
/// - Implements `HostInterop` over the registered definitions.
/// - Caches static resolution behind a coarse read/write lock.
pub mod registry;
/// Lazy numeric generator sequences.
///
/// Defines the sequence value produced by generator expressions: an integer
/// or floating stride walked on demand, stopping once the next value would
/// pass the end bound.
pub mod sequence;
/// Hashable set elements.
///
/// Wraps values into a hash- and equality-safe form so they can live in
/// sets; floating-point elements use a total ordering.
pub mod set_value;
/// The value module defines the runtime data types for reduction.
///
/// This module declares all the value types host calls and reductions
/// produce: null, integers, floating-point numbers, booleans, strings,
/// arrays, sets, lazy sequences and opaque host objects. It also provides
/// methods for type conversion, promotion, and comparison.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported value variants.
/// - Implements accessors, conversions and error checking.
/// - Provides safe promotion between numeric types.
pub mod value;
